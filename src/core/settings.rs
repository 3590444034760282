//! Build settings (`os`, `arch`, `build_type`, `compiler`, ...).

use std::collections::BTreeMap;

use serde::Serialize;

/// Ordered settings mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Settings::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn build_type(&self) -> Option<&str> {
        self.get("build_type")
    }

    pub fn arch(&self) -> Option<&str> {
        self.get("arch")
    }

    /// `compiler compiler.version`, if a compiler is set.
    pub fn compiler_label(&self) -> Option<String> {
        let compiler = self.get("compiler")?;
        Some(match self.get("compiler.version") {
            Some(version) => format!("{} {}", compiler, version),
            None => compiler.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_label() {
        let settings = Settings::new()
            .with("compiler", "gcc")
            .with("compiler.version", "9");
        assert_eq!(settings.compiler_label().as_deref(), Some("gcc 9"));

        assert_eq!(Settings::new().compiler_label(), None);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let settings = Settings::new().with("os", "Linux").with("arch", "x86_64");
        let keys: Vec<_> = settings.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["arch", "os"]);
    }
}
