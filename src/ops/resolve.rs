//! Package coordinate resolution.

use crate::core::coordinate::{
    is_valid_package_name, strip_version_prefix, PackageCoordinate, UNSET_PACKAGE_NAME,
};
use crate::util::config::{env, PackagerConfig};
use crate::util::errors::ConfigError;

/// Resolve the package coordinate for this run.
///
/// The version comes from the configured tag (or `CONAN_REFERENCE`) with its
/// version-control prefix stripped. The name falls back to the unset
/// placeholder, which is rejected when shared builds are disabled since the
/// filter could then never match.
pub fn resolve_coordinate(config: &PackagerConfig) -> Result<PackageCoordinate, ConfigError> {
    let raw_tag = config
        .version_tag
        .as_deref()
        .or_else(|| config.reference.as_ref().map(|r| r.version.as_str()))
        .ok_or_else(|| ConfigError::MissingVersion {
            searched: env::VERSION_SOURCES
                .iter()
                .chain(std::iter::once(&env::REFERENCE))
                .map(|s| s.to_string())
                .collect(),
        })?;

    let version = strip_version_prefix(raw_tag);
    if version.is_empty() {
        return Err(ConfigError::EmptyVersion {
            tag: raw_tag.to_string(),
        });
    }

    let name = config
        .package_name
        .as_deref()
        .or_else(|| config.reference.as_ref().map(|r| r.name.as_str()))
        .unwrap_or(UNSET_PACKAGE_NAME);

    if !is_valid_package_name(name) {
        return Err(ConfigError::InvalidPackageName {
            name: name.to_string(),
        });
    }

    if config.disable_shared && name == UNSET_PACKAGE_NAME {
        return Err(ConfigError::SharedFilterNeedsName);
    }

    let coordinate = PackageCoordinate::new(name, version)
        .with_channel(config.channel.as_str())
        .with_user(
            config
                .username
                .clone()
                .or_else(|| config.reference.as_ref().and_then(|r| r.user.clone())),
        );

    if coordinate.has_unset_name() {
        tracing::warn!("no package name configured; using placeholder `{}`", UNSET_PACKAGE_NAME);
    }
    if coordinate.semver().is_none() {
        tracing::warn!("version `{}` is not a semantic version", coordinate.version());
    }
    tracing::debug!("resolved coordinate {}", coordinate.full_reference());

    Ok(coordinate)
}
