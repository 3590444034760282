//! `buildmatrix plan` command

use anyhow::Result;

use buildmatrix::matrix::DefaultGenerator;
use buildmatrix::ops::plan_builds;
use buildmatrix::util::diagnostic::{emit, suggestions, Diagnostic};
use buildmatrix::util::shell::Status;

use crate::cli::{GlobalArgs, PlanArgs};

pub fn execute(args: PlanArgs, global: &GlobalArgs) -> Result<i32> {
    let ctx = super::context(global)?;
    let config = super::packager_config(&ctx, &args.packager)?;
    let shell = super::shell(&ctx, args.json);

    let generator = DefaultGenerator::new(config.axes.clone());
    let plan = plan_builds(&config, &generator)?;

    if args.json {
        shell.json_event(&plan.to_json());
        return Ok(0);
    }

    shell.status(
        Status::Generating,
        format!("{} configuration(s) for {}", plan.generated(), plan.coordinate.full_reference()),
    );
    if plan.shared_disabled {
        shell.status(
            Status::Removed,
            format!("{} shared configuration(s)", plan.removed.len()),
        );
    }
    if plan.matrix.is_empty() {
        if !shell.is_quiet() {
            let diag = Diagnostic::warning("nothing left to build").with_context(format!(
                "{} configuration(s) removed by the shared-build filter",
                plan.removed.len()
            ));
            emit(&diag, shell.use_color());
        }
        shell.note(suggestions::EMPTY_PLAN);
    }

    for (index, config) in plan.matrix.iter().enumerate() {
        println!("{:>3}  {}  {}", index + 1, config.fingerprint(), config.describe());
    }

    Ok(0)
}
