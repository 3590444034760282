//! Package coordinates - WHICH package a release publishes (name + version + channel).

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::Serialize;

use crate::util::errors::ConfigError;

/// Placeholder name used when no package name was configured.
///
/// A coordinate carrying this name can still be built, but the shared-build
/// filter cannot match options against it.
pub const UNSET_PACKAGE_NAME: &str = "SET-CONAN_PACKAGE_NAME-OR-CONAN_REFERENCE";

/// Default channel for published packages.
pub const DEFAULT_CHANNEL: &str = "stable";

/// Prefix git hosts put in front of tag refs.
const TAG_REF_PREFIX: &str = "refs/tags/";

/// Whether `name` can appear in a reference and an option key.
///
/// Rejects empty names, whitespace and the reference separators `/`, `@`, `:`.
pub fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || matches!(c, '/' | '@' | ':'))
}

/// Strip the version-control prefix from a raw tag.
///
/// Removes a leading `refs/tags/` and then a single leading `v` or `V`.
/// Tags without a prefix come back unchanged.
pub fn strip_version_prefix(tag: &str) -> &str {
    let tag = tag.trim();
    let tag = tag.strip_prefix(TAG_REF_PREFIX).unwrap_or(tag);
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

/// The coordinate of a distributable package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageCoordinate {
    name: String,
    version: String,
    channel: String,
    user: Option<String>,
}

impl PackageCoordinate {
    /// Create a coordinate on the default channel with no user.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PackageCoordinate {
            name: name.into(),
            version: version.into(),
            channel: DEFAULT_CHANNEL.to_string(),
            user: None,
        }
    }

    /// Set the channel.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Set the user (namespace) the package is published under.
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Whether the name is still the unset placeholder.
    pub fn has_unset_name(&self) -> bool {
        self.name == UNSET_PACKAGE_NAME
    }

    /// The version parsed as semver, if it is one.
    pub fn semver(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }

    /// Short reference: `name/version`.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Full reference: `name/version@user/channel`, or `name/version@` without a user.
    pub fn full_reference(&self) -> String {
        match &self.user {
            Some(user) => format!("{}/{}@{}/{}", self.name, self.version, user, self.channel),
            None => format!("{}/{}@", self.name, self.version),
        }
    }
}

impl fmt::Display for PackageCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// A parsed `name/version[@user/channel]` reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceParts {
    pub name: String,
    pub version: String,
    pub user: Option<String>,
    pub channel: Option<String>,
}

impl FromStr for ReferenceParts {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidReference {
            reference: s.to_string(),
        };

        let (base, namespace) = match s.trim().split_once('@') {
            Some((base, ns)) => (base, Some(ns)),
            None => (s.trim(), None),
        };

        let (name, version) = base.split_once('/').ok_or_else(invalid)?;
        if name.is_empty() || version.is_empty() || version.contains('/') {
            return Err(invalid());
        }

        let (user, channel) = match namespace {
            None | Some("") => (None, None),
            Some(ns) => {
                let (user, channel) = ns.split_once('/').ok_or_else(invalid)?;
                if user.is_empty() || channel.is_empty() {
                    return Err(invalid());
                }
                (Some(user.to_string()), Some(channel.to_string()))
            }
        };

        Ok(ReferenceParts {
            name: name.to_string(),
            version: version.to_string(),
            user,
            channel,
        })
    }
}
