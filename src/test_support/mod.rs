//! Test utilities and mocks for buildmatrix unit tests.
//!
//! Provides environment maps, ready-made build matrices and a command
//! executor that records commands instead of spawning them.
//!
//! # Example
//!
//! ```rust,ignore
//! use buildmatrix::test_support::{env_map, MockExecutor};
//!
//! #[test]
//! fn test_example() {
//!     let env = env_map(&[("CONAN_PACKAGE_NAME", "entt")]);
//!     let exec = MockExecutor::new().fail_on("conan upload", 1);
//!
//!     // Use in tests...
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::core::configuration::{BuildConfiguration, BuildMatrix};
use crate::core::coordinate::PackageCoordinate;
use crate::core::options::{OptionKey, OptionSet};
use crate::core::settings::Settings;
use crate::util::process::{CommandExecutor, ProcessBuilder};

/// Build an environment map from key/value pairs.
pub fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A matrix with one Release configuration per flag, `<package>:shared` set
/// to the flag. Each entry carries its position in `MATRIX_INDEX`.
pub fn matrix_with_shared_flags(package: &str, flags: &[bool]) -> BuildMatrix {
    let reference = PackageCoordinate::new(package, "3.2.0");
    let key = OptionKey::shared(package).unwrap();

    flags
        .iter()
        .enumerate()
        .map(|(i, shared)| {
            BuildConfiguration::new(reference.clone())
                .with_settings(Settings::new().with("build_type", "Release"))
                .with_options(OptionSet::new().with(key.clone(), *shared))
                .with_env("MATRIX_INDEX", i.to_string())
        })
        .collect()
}

/// A static-only matrix with one configuration per build type.
pub fn matrix_with_build_types(package: &str, build_types: &[&str]) -> BuildMatrix {
    let reference = PackageCoordinate::new(package, "3.2.0");
    let key = OptionKey::shared(package).unwrap();

    build_types
        .iter()
        .map(|build_type| {
            BuildConfiguration::new(reference.clone())
                .with_settings(Settings::new().with("build_type", *build_type))
                .with_options(OptionSet::new().with(key.clone(), false))
        })
        .collect()
}

/// The `<package>:shared` flag of every configuration, in order.
pub fn shared_flags(package: &str, matrix: &BuildMatrix) -> Vec<bool> {
    let key = OptionKey::shared(package).unwrap();
    matrix.iter().map(|c| c.is_shared(&key)).collect()
}

/// Records commands and returns programmed exit codes.
///
/// Clones share the same record, so a clone can be handed to a runner
/// while the test inspects the original.
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    commands: Arc<Mutex<Vec<String>>>,
    failures: Vec<(String, i32)>,
}

impl MockExecutor {
    /// Create an executor where every command succeeds.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    /// Fail commands containing `pattern` with `exit_code`.
    pub fn fail_on(mut self, pattern: impl Into<String>, exit_code: i32) -> Self {
        self.failures.push((pattern.into(), exit_code));
        self
    }

    /// All commands executed so far.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandExecutor for MockExecutor {
    fn status(&self, cmd: &ProcessBuilder) -> Result<i32> {
        let line = cmd.display_command();
        self.commands.lock().unwrap().push(line.clone());

        Ok(self
            .failures
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map_or(0, |(_, code)| *code))
    }
}
