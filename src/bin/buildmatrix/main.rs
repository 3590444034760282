//! buildmatrix CLI - build-matrix planning for Conan package releases

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use buildmatrix::util::diagnostic::emit;
use buildmatrix::ConfigError;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            match e.downcast_ref::<ConfigError>() {
                Some(config_err) => emit(&config_err.to_diagnostic(), color),
                None => eprintln!("error: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("buildmatrix=debug")
    } else if cli.quiet {
        EnvFilter::new("buildmatrix=warn")
    } else {
        EnvFilter::new("buildmatrix=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = cli::GlobalArgs {
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
        config: cli.config,
    };

    match cli.command {
        Commands::Reference(args) => commands::reference::execute(args, &global),
        Commands::Plan(args) => commands::plan::execute(args, &global),
        Commands::Run(args) => commands::run::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
