//! Command implementations

pub mod completions;
pub mod plan;
pub mod reference;
pub mod run;

use anyhow::Result;

use buildmatrix::util::config::{PackagerConfig, ProcessEnv};
use buildmatrix::util::shell::{ColorChoice, Shell};
use buildmatrix::GlobalContext;

use crate::cli::{GlobalArgs, PackagerArgs};

/// Build the context for a command from the global flags.
pub fn context(global: &GlobalArgs) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new()?.with_config_file(global.config.clone());
    ctx.set_verbose(global.verbose);
    ctx.set_quiet(global.quiet);
    ctx.set_color(!global.no_color);
    Ok(ctx)
}

/// Load the packager configuration and apply command-line overrides.
pub fn packager_config(ctx: &GlobalContext, args: &PackagerArgs) -> Result<PackagerConfig> {
    let mut config = ctx.packager_config(&ProcessEnv)?;
    config.apply(&args.overrides());
    Ok(config)
}

pub fn shell(ctx: &GlobalContext, json: bool) -> Shell {
    let color = if ctx.color() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    Shell::from_flags(ctx.is_quiet(), ctx.is_verbose(), color, json)
}
