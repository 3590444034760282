//! buildmatrix - build-matrix planning for Conan package releases
//!
//! This crate resolves the package coordinate for a release from CI
//! environment variables, generates the build matrix, filters it and hands
//! the result to a runner.

pub mod core;
pub mod matrix;
pub mod ops;
pub mod runner;
pub mod util;

/// Test utilities and mocks for buildmatrix unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildConfiguration, BuildMatrix, OptionKey, PackageCoordinate};
pub use ops::{plan_builds, resolve_coordinate, run_builds, BuildPlan};
pub use util::config::PackagerConfig;
pub use util::context::GlobalContext;
pub use util::errors::ConfigError;
