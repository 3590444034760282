//! Runner that drives the `conan` client.
//!
//! Each configuration becomes one `conan create` invocation. The run stops
//! at the first failing configuration and reports its exit code.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::core::configuration::BuildConfiguration;
use crate::runner::{BuildRunner, FailedBuild, RunJob, RunReport, UploadDecision, UploadOutcome};
use crate::util::process::{CommandExecutor, ProcessBuilder, SystemExecutor};
use crate::util::shell::{Shell, Status};

/// Remote name used when the upload target is a URL.
pub const UPLOAD_REMOTE_NAME: &str = "upload_repo";

/// Env variable carrying build requirements to the conan process.
pub const BUILD_REQUIRES_ENV: &str = "CONAN_BUILD_REQUIRES";

/// Runs builds and uploads with the conan client.
pub struct ConanRunner {
    conan: PathBuf,
    recipe_dir: PathBuf,
    login_username: Option<String>,
    executor: Box<dyn CommandExecutor>,
    shell: Arc<Shell>,
}

impl ConanRunner {
    /// Create a runner for the recipe in `recipe_dir`.
    pub fn new(conan: impl Into<PathBuf>, recipe_dir: impl Into<PathBuf>) -> Self {
        ConanRunner {
            conan: conan.into(),
            recipe_dir: recipe_dir.into(),
            login_username: None,
            executor: Box::new(SystemExecutor),
            shell: Arc::new(Shell::default()),
        }
    }

    /// Replace the command executor.
    pub fn with_executor(mut self, executor: Box<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_shell(mut self, shell: Arc<Shell>) -> Self {
        self.shell = shell;
        self
    }

    /// Login name exported to upload commands.
    pub fn with_login_username(mut self, login_username: Option<String>) -> Self {
        self.login_username = login_username;
        self
    }

    pub fn recipe_dir(&self) -> &Path {
        &self.recipe_dir
    }

    fn conan(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.conan).cwd(&self.recipe_dir)
    }

    /// The `conan create` command for one configuration.
    pub fn create_command(&self, job: &RunJob<'_>, config: &BuildConfiguration) -> ProcessBuilder {
        let mut cmd = self
            .conan()
            .args(["create", "."])
            .arg(job.coordinate.full_reference())
            .arg("--test-folder")
            .arg(job.test_folder);

        for (key, value) in config.settings.iter() {
            cmd = cmd.arg("-s").arg(format!("{}={}", key, value));
        }
        for (key, value) in config.options.iter() {
            cmd = cmd.arg("-o").arg(format!("{}={}", key, value));
        }
        for (key, value) in &config.env_vars {
            cmd = cmd.arg("-e").arg(format!("{}={}", key, value));
        }
        cmd = cmd.args(["--build", "missing"]);

        if !config.build_requires.is_empty() {
            cmd = cmd.env(BUILD_REQUIRES_ENV, config.build_requires.join(","));
        }

        cmd
    }

    fn exec(&self, cmd: &ProcessBuilder) -> Result<i32> {
        if self.shell.is_verbose() {
            self.shell.note(format!("`{}`", cmd.display_command()));
        }
        tracing::debug!("running `{}`", cmd.display_command());
        self.executor.status(cmd)
    }

    fn upload(&self, job: &RunJob<'_>) -> Result<UploadOutcome> {
        let target = match job.upload.decide(job.branch) {
            UploadDecision::Skip { reason } => {
                self.shell.status(Status::Skipped, format!("upload: {}", reason));
                return Ok(UploadOutcome::Skipped { reason });
            }
            UploadDecision::Upload { target } => target,
        };

        let remote = if target.contains("://") {
            let add = self
                .conan()
                .args(["remote", "add", UPLOAD_REMOTE_NAME])
                .arg(&target)
                .arg("--force");
            let code = self.exec(&add)?;
            if code != 0 {
                self.shell.error(format!("could not register remote `{}`", target));
                return Ok(UploadOutcome::Failed { exit_code: code });
            }
            UPLOAD_REMOTE_NAME.to_string()
        } else {
            target
        };

        self.shell.status(
            Status::Uploading,
            format!("{} to `{}`", job.coordinate.full_reference(), remote),
        );

        let mut cmd = self
            .conan()
            .arg("upload")
            .arg(job.coordinate.full_reference())
            .args(["-r", remote.as_str(), "--all", "--confirm"]);
        if let Some(ref login) = self.login_username {
            cmd = cmd.env("CONAN_LOGIN_USERNAME", login);
        }

        let code = self.exec(&cmd)?;
        if code != 0 {
            self.shell.error(format!("upload to `{}` failed", remote));
            return Ok(UploadOutcome::Failed { exit_code: code });
        }

        self.shell.status(Status::Uploaded, job.coordinate.full_reference());
        Ok(UploadOutcome::Uploaded { remote })
    }
}

impl BuildRunner for ConanRunner {
    fn run(&self, job: &RunJob<'_>) -> Result<RunReport> {
        let total = job.matrix.len();
        let mut built = 0;

        for (index, config) in job.matrix.iter().enumerate() {
            let fingerprint = config.fingerprint();
            self.shell.status(
                Status::Building,
                format!(
                    "[{}/{}] {} ({})",
                    index + 1,
                    total,
                    config.describe(),
                    fingerprint
                ),
            );

            let code = self.exec(&self.create_command(job, config))?;
            if code != 0 {
                self.shell.error(format!(
                    "configuration {} ({}) failed with exit code {}",
                    index + 1,
                    fingerprint,
                    code
                ));
                return Ok(RunReport {
                    built,
                    failed: Some(FailedBuild {
                        index,
                        fingerprint,
                        exit_code: code,
                    }),
                    upload: UploadOutcome::Skipped {
                        reason: "a build failed".to_string(),
                    },
                    exit_code: code,
                });
            }
            built += 1;
        }

        let upload = if built == 0 {
            UploadOutcome::Skipped {
                reason: "no configurations were built".to_string(),
            }
        } else {
            self.upload(job)?
        };

        let exit_code = match &upload {
            UploadOutcome::Failed { exit_code } => *exit_code,
            _ => 0,
        };

        Ok(RunReport {
            built,
            failed: None,
            upload,
            exit_code,
        })
    }
}
