//! Package options keyed by `(package, option)`.
//!
//! Conan spells option keys as `pkg:option` strings. Here the key is split
//! and validated once, so lookups never format strings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::util::errors::ConfigError;

/// Name of the option that selects shared linkage.
pub const SHARED_OPTION: &str = "shared";

/// A structured option key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionKey {
    package: String,
    option: String,
}

impl OptionKey {
    /// Create a validated option key.
    pub fn new(package: impl Into<String>, option: impl Into<String>) -> Result<Self, ConfigError> {
        let package = package.into();
        let option = option.into();

        let valid = |s: &str| !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == ':');
        if !valid(&package) || !valid(&option) {
            return Err(ConfigError::InvalidOptionKey {
                key: format!("{}:{}", package, option),
            });
        }

        Ok(OptionKey { package, option })
    }

    /// Key of the `shared` option for a package.
    pub fn shared(package: &str) -> Result<Self, ConfigError> {
        Self::new(package, SHARED_OPTION)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn option(&self) -> &str {
        &self.option
    }
}

impl FromStr for OptionKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (package, option) = s.split_once(':').ok_or_else(|| ConfigError::InvalidOptionKey {
            key: s.to_string(),
        })?;
        OptionKey::new(package, option)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.option)
    }
}

/// An option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    /// Parse a raw value; `True`/`False` in any case become booleans.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "true" => OptionValue::Bool(true),
            "false" => OptionValue::Bool(false),
            _ => OptionValue::Text(raw.to_string()),
        }
    }

    /// True only for `Bool(true)`.
    pub fn is_true(&self) -> bool {
        matches!(self, OptionValue::Bool(true))
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Conan expects Python-style booleans.
            OptionValue::Bool(true) => write!(f, "True"),
            OptionValue::Bool(false) => write!(f, "False"),
            OptionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Ordered option mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    values: BTreeMap<OptionKey, OptionValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        OptionSet::default()
    }

    /// Insert or replace an option.
    pub fn insert(&mut self, key: OptionKey, value: impl Into<OptionValue>) {
        self.values.insert(key, value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &OptionKey) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Whether the option is present and `True`.
    pub fn is_enabled(&self, key: &OptionKey) -> bool {
        self.get(key).is_some_and(OptionValue::is_true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &OptionValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse `pkg:opt=value` assignments.
    pub fn parse_assignments<'a>(
        items: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let mut set = OptionSet::new();
        for item in items {
            let (key, value) = item.split_once('=').ok_or_else(|| ConfigError::InvalidOptionKey {
                key: item.to_string(),
            })?;
            set.insert(key.trim().parse()?, OptionValue::parse(value.trim()));
        }
        Ok(set)
    }
}

impl Serialize for OptionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.values.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }
}
