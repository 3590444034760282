//! Packager configuration.
//!
//! Configuration is read once at start-up into a [`PackagerConfig`] and
//! passed by reference from then on. Sources, highest precedence first:
//! - CLI flags ([`ConfigOverrides`])
//! - Environment variables (through an [`EnvSource`])
//! - Project config: `buildmatrix.toml`, searched upward from the cwd
//! - Global config: `~/.buildmatrix/config.toml`
//! - Defaults

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::coordinate::{ReferenceParts, DEFAULT_CHANNEL};
use crate::core::options::OptionSet;
use crate::matrix::generator::MatrixAxes;
use crate::util::errors::ConfigError;

/// Environment variable names.
pub mod env {
    pub const PACKAGE_NAME: &str = "CONAN_PACKAGE_NAME";
    pub const REFERENCE: &str = "CONAN_REFERENCE";
    pub const PACKAGE_VERSION: &str = "CONAN_PACKAGE_VERSION";
    pub const TRAVIS_TAG: &str = "TRAVIS_TAG";
    pub const GITHUB_REF: &str = "GITHUB_REF";
    pub const CHANNEL: &str = "CONAN_CHANNEL";
    pub const USERNAME: &str = "CONAN_USERNAME";
    pub const LOGIN_USERNAME: &str = "CONAN_LOGIN_USERNAME";
    pub const UPLOAD: &str = "CONAN_UPLOAD";
    pub const STABLE_BRANCH_PATTERN: &str = "CONAN_STABLE_BRANCH_PATTERN";
    pub const TEST_FOLDER: &str = "CPT_TEST_FOLDER";
    pub const UPLOAD_ONLY_WHEN_STABLE: &str = "CONAN_UPLOAD_ONLY_WHEN_STABLE";
    pub const HEADER_ONLY: &str = "CONAN_HEADER_ONLY";
    pub const PURE_C: &str = "CONAN_PURE_C";
    pub const DISABLE_SHARED_BUILD: &str = "CONAN_DISABLE_SHARED_BUILD";
    pub const ARCHS: &str = "CONAN_ARCHS";
    pub const BUILD_TYPES: &str = "CONAN_BUILD_TYPES";
    pub const GCC_VERSIONS: &str = "CONAN_GCC_VERSIONS";
    pub const CLANG_VERSIONS: &str = "CONAN_CLANG_VERSIONS";
    pub const OPTIONS: &str = "CONAN_OPTIONS";

    /// Variables that can carry the version tag, in lookup order.
    pub const VERSION_SOURCES: &[&str] = &[PACKAGE_VERSION, TRAVIS_TAG, GITHUB_REF];
}

/// Name of the project config file.
pub const PROJECT_CONFIG_NAME: &str = "buildmatrix.toml";

/// Default pattern for branches whose builds may be uploaded.
pub const DEFAULT_STABLE_BRANCH_PATTERN: &str = r"v\d+\.\d+\.\d+.*";

/// Default location of the consumer test package.
pub const DEFAULT_TEST_FOLDER: &str = "conan/test_package";

/// Read access to environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Look up a variable, treating empty values as unset.
fn non_empty(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a boolean-like value. Empty means unset.
pub fn parse_bool(key: &str, raw: &str) -> Result<Option<bool>, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn env_bool(env: &dyn EnvSource, key: &str) -> Result<Option<bool>, ConfigError> {
    match env.var(key) {
        Some(raw) => parse_bool(key, &raw),
        None => Ok(None),
    }
}

fn env_list(env: &dyn EnvSource, key: &str) -> Option<Vec<String>> {
    non_empty(env, key).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// Config file contents (`buildmatrix.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub package: PackageSection,
    pub build: BuildSection,
    pub upload: UploadSection,
    pub matrix: MatrixSection,
}

/// `[package]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSection {
    pub name: Option<String>,
    pub reference: Option<String>,
    pub version: Option<String>,
    pub channel: Option<String>,
    pub user: Option<String>,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub test_folder: Option<PathBuf>,
    pub header_only: Option<bool>,
    pub pure_c: Option<bool>,
    pub disable_shared: Option<bool>,
}

/// `[upload]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSection {
    pub remote: Option<String>,
    pub only_when_stable: Option<bool>,
    pub stable_branch_pattern: Option<String>,
}

/// `[matrix]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixSection {
    pub archs: Option<Vec<String>>,
    pub build_types: Option<Vec<String>>,
    pub gcc_versions: Option<Vec<String>>,
    pub clang_versions: Option<Vec<String>>,
    /// Extra `pkg:option=value` assignments applied to every configuration
    pub options: Option<Vec<String>>,
}

macro_rules! merge_fields {
    ($dst:expr, $src:expr, $($field:ident),+) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field;
            }
        )+
    };
}

impl FileConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: FileConfig) {
        merge_fields!(self.package, other.package, name, reference, version, channel, user);
        merge_fields!(self.build, other.build, test_folder, header_only, pure_c, disable_shared);
        merge_fields!(self.upload, other.upload, remote, only_when_stable, stable_branch_pattern);
        merge_fields!(self.matrix, other.matrix, archs, build_types, gcc_versions, clang_versions, options);
    }
}

/// Load merged file configuration from the global and project locations.
///
/// Missing files are skipped; files that exist must parse.
pub fn load_file_config(global_path: Option<&Path>, project_path: Option<&Path>) -> Result<FileConfig> {
    let mut config = FileConfig::default();

    for path in [global_path, project_path].into_iter().flatten() {
        if path.exists() {
            tracing::debug!("loading config from {}", path.display());
            config.merge(FileConfig::load(path)?);
        }
    }

    Ok(config)
}

/// Overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub name: Option<String>,
    pub version_tag: Option<String>,
    pub channel: Option<String>,
    pub disable_shared: bool,
    /// `Some(true)` for `--header-only`, `Some(false)` for `--common-builds`
    pub header_only: Option<bool>,
    pub pure_c: bool,
}

/// Fully resolved packager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagerConfig {
    /// Explicit package name
    pub package_name: Option<String>,
    /// Raw version tag, possibly prefixed (`refs/tags/v1.2.3`)
    pub version_tag: Option<String>,
    /// `CONAN_REFERENCE`, used as a fallback for name and version
    pub reference: Option<ReferenceParts>,
    pub channel: String,
    pub username: Option<String>,
    /// Passed through to the conan client
    pub login_username: Option<String>,
    /// Upload target: a remote name or URL
    pub upload: Option<String>,
    pub stable_branch_pattern: String,
    pub test_folder: PathBuf,
    pub upload_only_when_stable: bool,
    /// Only an explicit `false` selects the common-builds matrix
    pub header_only: Option<bool>,
    pub pure_c: bool,
    pub disable_shared: bool,
    pub axes: MatrixAxes,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        PackagerConfig {
            package_name: None,
            version_tag: None,
            reference: None,
            channel: DEFAULT_CHANNEL.to_string(),
            username: None,
            login_username: None,
            upload: None,
            stable_branch_pattern: DEFAULT_STABLE_BRANCH_PATTERN.to_string(),
            test_folder: PathBuf::from(DEFAULT_TEST_FOLDER),
            upload_only_when_stable: true,
            header_only: None,
            pure_c: false,
            disable_shared: false,
            axes: MatrixAxes::default(),
        }
    }
}

impl PackagerConfig {
    /// Build the configuration from the environment layered over file config.
    pub fn load(env: &dyn EnvSource, file: &FileConfig) -> Result<Self, ConfigError> {
        let defaults = PackagerConfig::default();

        let version_tag = non_empty(env, env::PACKAGE_VERSION)
            .or_else(|| non_empty(env, env::TRAVIS_TAG))
            .or_else(|| non_empty(env, env::GITHUB_REF).filter(|r| r.starts_with("refs/tags/")))
            .or_else(|| file.package.version.clone());

        let reference = non_empty(env, env::REFERENCE)
            .or_else(|| file.package.reference.clone())
            .map(|r| r.parse::<ReferenceParts>())
            .transpose()?;

        let extra_options = env_list(env, env::OPTIONS)
            .or_else(|| file.matrix.options.clone())
            .unwrap_or_default();

        let axes = MatrixAxes {
            archs: env_list(env, env::ARCHS)
                .or_else(|| file.matrix.archs.clone())
                .unwrap_or(defaults.axes.archs),
            build_types: env_list(env, env::BUILD_TYPES)
                .or_else(|| file.matrix.build_types.clone())
                .unwrap_or(defaults.axes.build_types),
            gcc_versions: env_list(env, env::GCC_VERSIONS)
                .or_else(|| file.matrix.gcc_versions.clone())
                .unwrap_or_default(),
            clang_versions: env_list(env, env::CLANG_VERSIONS)
                .or_else(|| file.matrix.clang_versions.clone())
                .unwrap_or_default(),
            options: OptionSet::parse_assignments(extra_options.iter().map(String::as_str))?,
        };

        let config = PackagerConfig {
            package_name: non_empty(env, env::PACKAGE_NAME).or_else(|| file.package.name.clone()),
            version_tag,
            reference,
            channel: non_empty(env, env::CHANNEL)
                .or_else(|| file.package.channel.clone())
                .unwrap_or(defaults.channel),
            username: non_empty(env, env::USERNAME).or_else(|| file.package.user.clone()),
            login_username: non_empty(env, env::LOGIN_USERNAME),
            upload: non_empty(env, env::UPLOAD).or_else(|| file.upload.remote.clone()),
            stable_branch_pattern: non_empty(env, env::STABLE_BRANCH_PATTERN)
                .or_else(|| file.upload.stable_branch_pattern.clone())
                .unwrap_or(defaults.stable_branch_pattern),
            test_folder: non_empty(env, env::TEST_FOLDER)
                .map(PathBuf::from)
                .or_else(|| file.build.test_folder.clone())
                .unwrap_or(defaults.test_folder),
            upload_only_when_stable: env_bool(env, env::UPLOAD_ONLY_WHEN_STABLE)?
                .or(file.upload.only_when_stable)
                .unwrap_or(defaults.upload_only_when_stable),
            header_only: env_bool(env, env::HEADER_ONLY)?.or(file.build.header_only),
            pure_c: env_bool(env, env::PURE_C)?
                .or(file.build.pure_c)
                .unwrap_or(defaults.pure_c),
            disable_shared: env_bool(env, env::DISABLE_SHARED_BUILD)?
                .or(file.build.disable_shared)
                .unwrap_or(defaults.disable_shared),
            axes,
        };

        config.stable_branch_regex()?;
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref name) = overrides.name {
            self.package_name = Some(name.clone());
        }
        if let Some(ref tag) = overrides.version_tag {
            self.version_tag = Some(tag.clone());
        }
        if let Some(ref channel) = overrides.channel {
            self.channel = channel.clone();
        }
        self.disable_shared |= overrides.disable_shared;
        if overrides.header_only.is_some() {
            self.header_only = overrides.header_only;
        }
        self.pure_c |= overrides.pure_c;
    }

    /// The stable-branch pattern, anchored at the start of the branch name.
    pub fn stable_branch_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&format!("^(?:{})", self.stable_branch_pattern)).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: self.stable_branch_pattern.clone(),
                message: e.to_string(),
            }
        })
    }
}

/// Get the global config directory (~/.buildmatrix).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".buildmatrix"))
}

/// Get the global config path (~/.buildmatrix/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
