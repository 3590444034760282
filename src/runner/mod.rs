//! Build execution.
//!
//! A [`BuildRunner`] receives the filtered matrix and executes it. The
//! runner owns everything after the hand-off: builds, the upload decision
//! and the exit code the process finishes with.

pub mod conan;
pub mod upload;

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::core::configuration::BuildMatrix;
use crate::core::coordinate::PackageCoordinate;

pub use conan::ConanRunner;
pub use upload::{detect_branch, UploadDecision, UploadPolicy};

/// Everything a runner needs to execute one release.
#[derive(Debug, Clone)]
pub struct RunJob<'a> {
    pub coordinate: &'a PackageCoordinate,
    pub matrix: &'a BuildMatrix,
    pub test_folder: &'a Path,
    pub upload: &'a UploadPolicy,
    /// Branch being built, if known
    pub branch: Option<&'a str>,
}

/// The configuration that stopped a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBuild {
    pub index: usize,
    pub fingerprint: String,
    pub exit_code: i32,
}

/// What happened to the upload step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Skipped { reason: String },
    Uploaded { remote: String },
    Failed { exit_code: i32 },
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Configurations built successfully
    pub built: usize,
    pub failed: Option<FailedBuild>,
    pub upload: UploadOutcome,
    /// Exit code for the process
    pub exit_code: i32,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes a filtered build matrix.
pub trait BuildRunner {
    fn run(&self, job: &RunJob<'_>) -> Result<RunReport>;
}
