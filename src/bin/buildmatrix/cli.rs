//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use buildmatrix::util::config::ConfigOverrides;

/// buildmatrix - plan and run the build matrix of a Conan package release
#[derive(Parser)]
#[command(name = "buildmatrix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use this config file instead of searching for buildmatrix.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    pub verbose: bool,
    pub quiet: bool,
    pub no_color: bool,
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved package reference
    Reference(ReferenceArgs),

    /// Show the filtered build matrix without building
    Plan(PlanArgs),

    /// Build every configuration and upload the result
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Overrides for values normally taken from the environment.
#[derive(Args, Debug, Default)]
pub struct PackagerArgs {
    /// Package name (overrides CONAN_PACKAGE_NAME)
    #[arg(long)]
    pub name: Option<String>,

    /// Version tag, e.g. `refs/tags/v1.2.3` (overrides CONAN_PACKAGE_VERSION and CI tags)
    #[arg(long, value_name = "TAG")]
    pub version_tag: Option<String>,

    /// Package channel (overrides CONAN_CHANNEL)
    #[arg(long)]
    pub channel: Option<String>,

    /// Drop configurations that build the package as a shared library
    #[arg(long)]
    pub disable_shared: bool,

    /// Build a single header-only configuration (overrides CONAN_HEADER_ONLY)
    #[arg(long)]
    pub header_only: bool,

    /// Build every common configuration (same as CONAN_HEADER_ONLY=False)
    #[arg(long, conflicts_with = "header_only")]
    pub common_builds: bool,

    /// The package is pure C; omit the C++ standard library setting
    #[arg(long)]
    pub pure_c: bool,
}

impl PackagerArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            name: self.name.clone(),
            version_tag: self.version_tag.clone(),
            channel: self.channel.clone(),
            disable_shared: self.disable_shared,
            header_only: if self.header_only {
                Some(true)
            } else if self.common_builds {
                Some(false)
            } else {
                None
            },
            pure_c: self.pure_c,
        }
    }
}

#[derive(Args)]
pub struct ReferenceArgs {
    #[command(flatten)]
    pub packager: PackagerArgs,

    /// Include user and channel (`name/version@user/channel`)
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub packager: PackagerArgs,

    /// Output the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub packager: PackagerArgs,

    /// Directory containing the recipe (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub recipe_dir: Option<PathBuf>,

    /// Path to the conan client
    #[arg(long, value_name = "PATH")]
    pub conan: Option<PathBuf>,

    /// Print the commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
