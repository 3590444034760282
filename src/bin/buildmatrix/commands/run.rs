//! `buildmatrix run` command

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use buildmatrix::matrix::DefaultGenerator;
use buildmatrix::ops::{plan_builds, run_builds};
use buildmatrix::runner::{detect_branch, ConanRunner, UploadOutcome};
use buildmatrix::util::config::ProcessEnv;
use buildmatrix::util::diagnostic::{emit, suggestions, Diagnostic};
use buildmatrix::util::process::{find_conan, CommandExecutor, ProcessBuilder};
use buildmatrix::util::shell::Status;

use crate::cli::{GlobalArgs, RunArgs};

/// Prints commands instead of running them.
struct DryRunExecutor;

impl CommandExecutor for DryRunExecutor {
    fn status(&self, cmd: &ProcessBuilder) -> Result<i32> {
        println!("{}", cmd.display_command());
        Ok(0)
    }
}

pub fn execute(args: RunArgs, global: &GlobalArgs) -> Result<i32> {
    let start = Instant::now();
    let ctx = super::context(global)?;
    let config = super::packager_config(&ctx, &args.packager)?;
    let shell = Arc::new(super::shell(&ctx, false));

    let recipe_dir = match args.recipe_dir {
        Some(ref dir) if dir.is_absolute() => dir.clone(),
        Some(ref dir) => ctx.cwd().join(dir),
        None => ctx.cwd().to_path_buf(),
    };

    shell.status(Status::Resolving, "package reference");
    let generator = DefaultGenerator::new(config.axes.clone());
    let plan = plan_builds(&config, &generator)?;
    shell.status(
        Status::Generating,
        format!(
            "{} of {} configuration(s) for {}",
            plan.matrix.len(),
            plan.generated(),
            plan.coordinate.full_reference()
        ),
    );

    let conan = match args.conan.clone().or_else(find_conan) {
        Some(path) => path,
        None if args.dry_run => "conan".into(),
        None => {
            let diag = Diagnostic::error("conan client not found")
                .with_context("searched CONAN_EXE and PATH");
            emit(&diag, shell.use_color());
            shell.note(suggestions::CONAN_NOT_FOUND);
            return Ok(1);
        }
    };

    if !args.dry_run {
        if let Ok(output) = ProcessBuilder::new(&conan).arg("--version").exec() {
            tracing::debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        }
    }

    let mut runner = ConanRunner::new(conan, recipe_dir)
        .with_shell(Arc::clone(&shell))
        .with_login_username(config.login_username.clone());
    if args.dry_run {
        runner = runner.with_executor(Box::new(DryRunExecutor));
    }

    let branch = detect_branch(&ProcessEnv, runner.recipe_dir());
    let report = run_builds(&config, &plan, &runner, branch.as_deref())?;

    if report.failed.is_some() {
        shell.note(suggestions::BUILD_FAILED);
    } else if !matches!(report.upload, UploadOutcome::Failed { .. }) {
        shell.finished(
            format!("{} configuration(s) of {}", report.built, plan.coordinate),
            start.elapsed(),
        );
    }

    Ok(report.exit_code)
}
