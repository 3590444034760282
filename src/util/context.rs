//! Global context for buildmatrix operations.
//!
//! Provides centralized access to the working directory, config file
//! locations and output preferences.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{
    global_config_path, load_file_config, EnvSource, FileConfig, PackagerConfig,
    PROJECT_CONFIG_NAME,
};

/// Global context containing paths and output preferences.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Explicit config file (`--config`), replaces the upward search
    config_override: Option<PathBuf>,

    /// Whether to use verbose output
    verbose: bool,

    /// Only print errors
    quiet: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            config_override: None,
            verbose: false,
            quiet: false,
            color: true,
        }
    }

    /// Use an explicit config file instead of searching for one.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_override = path;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set quiet mode.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Find `buildmatrix.toml` starting from cwd and searching upward.
    pub fn find_project_config(&self) -> Option<PathBuf> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(PROJECT_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load the merged global + project config files.
    pub fn file_config(&self) -> Result<FileConfig> {
        let project = match &self.config_override {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => self.find_project_config(),
        };

        load_file_config(global_config_path().as_deref(), project.as_deref())
    }

    /// Populate the packager configuration from files and the environment.
    pub fn packager_config(&self, env: &dyn EnvSource) -> Result<PackagerConfig> {
        let file = self.file_config()?;
        Ok(PackagerConfig::load(env, &file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env_map;
    use tempfile::TempDir;

    #[test]
    fn test_find_project_config_upward() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join(PROJECT_CONFIG_NAME);
        std::fs::write(&config, "[package]\nname = \"entt\"\n").unwrap();

        let nested = tmp.path().join("conan").join("test_package");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_project_config(), Some(config));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .with_config_file(Some(tmp.path().join("missing.toml")));

        assert!(ctx.file_config().is_err());
    }

    #[test]
    fn test_packager_config_reads_project_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(PROJECT_CONFIG_NAME),
            "[package]\nname = \"entt\"\nversion = \"v3.2.0\"\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let config = ctx.packager_config(&env_map(&[])).unwrap();

        assert_eq!(config.package_name.as_deref(), Some("entt"));
        assert_eq!(config.version_tag.as_deref(), Some("v3.2.0"));
    }
}
