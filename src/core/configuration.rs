//! Build configurations and the build matrix.
//!
//! A `BuildConfiguration` is one settings/options/env combination to build.
//! Configurations are produced by a generator and never mutated afterwards;
//! the matrix only ever drops whole entries.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::coordinate::PackageCoordinate;
use crate::core::options::{OptionKey, OptionSet};
use crate::core::settings::Settings;
use crate::util::hash::Fingerprint;

/// One entry of the build matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    pub settings: Settings,
    pub options: OptionSet,
    pub env_vars: BTreeMap<String, String>,
    pub build_requires: Vec<String>,
    pub reference: PackageCoordinate,
}

impl BuildConfiguration {
    /// Create a configuration with no settings, options or env.
    pub fn new(reference: PackageCoordinate) -> Self {
        BuildConfiguration {
            settings: Settings::new(),
            options: OptionSet::new(),
            env_vars: BTreeMap::new(),
            build_requires: Vec::new(),
            reference,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_build_require(mut self, reference: impl Into<String>) -> Self {
        self.build_requires.push(reference.into());
        self
    }

    /// Whether `package:shared` is set to `True`.
    pub fn is_shared(&self, key: &OptionKey) -> bool {
        self.options.is_enabled(key)
    }

    /// Stable short id derived from everything that affects the build.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        fp.update_str(&self.reference.full_reference());
        for (k, v) in self.settings.iter() {
            fp.update_str(k).update_str(v);
        }
        fp.update_str("--options");
        for (k, v) in self.options.iter() {
            fp.update_str(&k.to_string()).update_str(&v.to_string());
        }
        fp.update_str("--env");
        for (k, v) in &self.env_vars {
            fp.update_str(k).update_str(v);
        }
        fp.update_str("--build-requires");
        fp.update_strs(self.build_requires.iter().map(String::as_str));
        fp.finish_short()
    }

    /// One-line human summary, e.g. `gcc 9 x86_64 Release entt:shared=True`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(compiler) = self.settings.compiler_label() {
            parts.push(compiler);
        }
        if let Some(arch) = self.settings.arch() {
            parts.push(arch.to_string());
        }
        if let Some(build_type) = self.settings.build_type() {
            parts.push(build_type.to_string());
        }
        for (k, v) in self.options.iter() {
            parts.push(format!("{}={}", k, v));
        }
        if parts.is_empty() {
            "default profile".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Ordered sequence of build configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildMatrix {
    configurations: Vec<BuildConfiguration>,
}

impl BuildMatrix {
    pub fn new() -> Self {
        BuildMatrix::default()
    }

    pub fn push(&mut self, config: BuildConfiguration) {
        self.configurations.push(config);
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuildConfiguration> {
        self.configurations.iter()
    }

    pub fn configurations(&self) -> &[BuildConfiguration] {
        &self.configurations
    }

    /// Split into (kept, dropped) by a predicate, preserving relative order.
    pub fn partition(self, keep: impl Fn(&BuildConfiguration) -> bool) -> (BuildMatrix, BuildMatrix) {
        let (kept, dropped): (Vec<_>, Vec<_>) = self.configurations.into_iter().partition(|c| keep(c));
        (
            BuildMatrix { configurations: kept },
            BuildMatrix {
                configurations: dropped,
            },
        )
    }
}

impl From<Vec<BuildConfiguration>> for BuildMatrix {
    fn from(configurations: Vec<BuildConfiguration>) -> Self {
        BuildMatrix { configurations }
    }
}

impl FromIterator<BuildConfiguration> for BuildMatrix {
    fn from_iter<I: IntoIterator<Item = BuildConfiguration>>(iter: I) -> Self {
        BuildMatrix {
            configurations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BuildMatrix {
    type Item = BuildConfiguration;
    type IntoIter = std::vec::IntoIter<BuildConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.configurations.into_iter()
    }
}

impl<'a> IntoIterator for &'a BuildMatrix {
    type Item = &'a BuildConfiguration;
    type IntoIter = std::slice::Iter<'a, BuildConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.configurations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(build_type: &str, shared: bool) -> BuildConfiguration {
        BuildConfiguration::new(PackageCoordinate::new("entt", "3.2.0"))
            .with_settings(Settings::new().with("build_type", build_type))
            .with_options(OptionSet::new().with(OptionKey::shared("entt").unwrap(), shared))
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(config("Release", true).fingerprint(), config("Release", true).fingerprint());
        assert_eq!(config("Release", true).fingerprint().len(), 16);
    }

    #[test]
    fn test_fingerprint_differs_per_configuration() {
        assert_ne!(config("Release", true).fingerprint(), config("Release", false).fingerprint());
        assert_ne!(config("Release", true).fingerprint(), config("Debug", true).fingerprint());
        assert_ne!(
            config("Release", true).fingerprint(),
            config("Release", true).with_env("CXXFLAGS", "-O3").fingerprint()
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(config("Debug", true).describe(), "Debug entt:shared=True");
        assert_eq!(
            BuildConfiguration::new(PackageCoordinate::new("entt", "3.2.0")).describe(),
            "default profile"
        );
    }

    #[test]
    fn test_partition_keeps_order() {
        let matrix: BuildMatrix = vec![
            config("Release", true),
            config("Release", false),
            config("Debug", true),
            config("Debug", false),
        ]
        .into();

        let key = OptionKey::shared("entt").unwrap();
        let (kept, dropped) = matrix.partition(|c| !c.is_shared(&key));

        let kept: Vec<_> = kept.iter().map(|c| c.settings.build_type().unwrap()).collect();
        assert_eq!(kept, vec!["Release", "Debug"]);
        assert_eq!(dropped.len(), 2);
    }
}
