//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the extra environment.
    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Get the working directory.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command capturing its output.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))
    }

    /// Execute with inherited stdio and return the exit code.
    ///
    /// A process killed by a signal reports exit code 1.
    pub fn status(&self) -> Result<i32> {
        let mut cmd = self.build_command();
        let status = cmd
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))?;
        Ok(status.code().unwrap_or(1))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs prepared commands.
///
/// The conan runner goes through this so tests can record commands
/// instead of spawning them.
pub trait CommandExecutor {
    /// Run to completion with inherited stdio, returning the exit code.
    fn status(&self, cmd: &ProcessBuilder) -> Result<i32>;
}

/// Executes commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn status(&self, cmd: &ProcessBuilder) -> Result<i32> {
        cmd.status()
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find the conan client.
pub fn find_conan() -> Option<PathBuf> {
    // Check CONAN_EXE environment variable first
    if let Ok(conan) = std::env::var("CONAN_EXE") {
        if let Some(path) = find_executable(&conan) {
            return Some(path);
        }
    }

    find_executable("conan")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let cmd = ProcessBuilder::new("conan")
            .arg("create")
            .args([".", "entt/3.2.0@"]);

        assert_eq!(cmd.display_command(), "conan create . entt/3.2.0@");
        assert_eq!(cmd.get_args().len(), 3);
    }

    #[test]
    fn test_env_and_cwd() {
        let cmd = ProcessBuilder::new("conan")
            .env("CONAN_BUILD_REQUIRES", "cmake/3.16.0")
            .cwd("/tmp");

        assert_eq!(
            cmd.get_env().get("CONAN_BUILD_REQUIRES").map(String::as_str),
            Some("cmake/3.16.0")
        );
        assert_eq!(cmd.get_cwd(), Some(Path::new("/tmp")));
    }

    #[cfg(unix)]
    #[test]
    fn test_status_reports_exit_code() {
        let code = ProcessBuilder::new("sh").args(["-c", "exit 3"]).status().unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        assert!(ProcessBuilder::new("definitely-not-a-real-program-xyz")
            .status()
            .is_err());
    }
}
