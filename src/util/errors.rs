//! Configuration error types and diagnostics.
//!
//! Every variant is fatal and raised before any build starts.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Missing or invalid required input.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigError {
    #[error("no package version found")]
    #[diagnostic(
        code(buildmatrix::config::missing_version),
        help("Set CONAN_PACKAGE_VERSION or build from a tagged commit")
    )]
    MissingVersion { searched: Vec<String> },

    #[error("version tag `{tag}` is empty once its prefix is stripped")]
    #[diagnostic(code(buildmatrix::config::empty_version))]
    EmptyVersion { tag: String },

    #[error("disabling shared builds requires an explicit package name")]
    #[diagnostic(
        code(buildmatrix::config::shared_filter_needs_name),
        help("Set CONAN_PACKAGE_NAME or CONAN_REFERENCE")
    )]
    SharedFilterNeedsName,

    #[error("invalid value `{value}` for `{key}`: expected a boolean")]
    #[diagnostic(code(buildmatrix::config::invalid_flag))]
    InvalidFlag { key: String, value: String },

    #[error("invalid package name `{name}`")]
    #[diagnostic(
        code(buildmatrix::config::invalid_package_name),
        help("Package names may not contain whitespace, `/`, `@` or `:`")
    )]
    InvalidPackageName { name: String },

    #[error("invalid option key `{key}`: expected `package:option`")]
    #[diagnostic(code(buildmatrix::config::invalid_option_key))]
    InvalidOptionKey { key: String },

    #[error("invalid package reference `{reference}`")]
    #[diagnostic(
        code(buildmatrix::config::invalid_reference),
        help("Use the form `name/version` or `name/version@user/channel`")
    )]
    InvalidReference { reference: String },

    #[error("invalid stable branch pattern `{pattern}`: {message}")]
    #[diagnostic(code(buildmatrix::config::invalid_pattern))]
    InvalidPattern { pattern: String, message: String },
}

impl ConfigError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigError::MissingVersion { searched } => {
                Diagnostic::error("no package version found")
                    .with_context(format!("looked at: {}", searched.join(", ")))
                    .with_suggestion("Set CONAN_PACKAGE_VERSION to the version to publish")
                    .with_suggestion("Run from a tag build so TRAVIS_TAG or GITHUB_REF is set")
            }

            ConfigError::EmptyVersion { tag } => {
                Diagnostic::error(format!("version tag `{}` carries no version", tag))
                    .with_suggestion("Tag releases as `vX.Y.Z`")
            }

            ConfigError::SharedFilterNeedsName => Diagnostic::error(
                "disabling shared builds requires an explicit package name",
            )
            .with_context("CONAN_DISABLE_SHARED_BUILD is set but no package name was given")
            .with_context("the `shared` option cannot be matched without a name")
            .with_suggestion("Set CONAN_PACKAGE_NAME")
            .with_suggestion("Set CONAN_REFERENCE to `name/version`"),

            ConfigError::InvalidFlag { key, value } => {
                Diagnostic::error(format!("invalid value `{}` for `{}`", value, key))
                    .with_suggestion("Use one of: true, false, 1, 0, yes, no, on, off")
            }

            ConfigError::InvalidPackageName { name } => {
                Diagnostic::error(format!("invalid package name `{}`", name))
                    .with_context("the name is used in the reference and in `name:shared`")
                    .with_suggestion("Use a name without whitespace, `/`, `@` or `:`")
            }

            ConfigError::InvalidOptionKey { key } => {
                Diagnostic::error(format!("invalid option key `{}`", key))
                    .with_suggestion("Option keys have the form `package:option`")
            }

            ConfigError::InvalidReference { reference } => {
                Diagnostic::error(format!("invalid package reference `{}`", reference))
                    .with_suggestion("Use `name/version` or `name/version@user/channel`")
            }

            ConfigError::InvalidPattern { pattern, message } => {
                Diagnostic::error(format!("invalid stable branch pattern `{}`", pattern))
                    .with_context(message.clone())
                    .with_suggestion("Check CONAN_STABLE_BRANCH_PATTERN is a valid regex")
            }
        }
    }
}
