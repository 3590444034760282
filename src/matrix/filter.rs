//! Shared-build retention filter.
//!
//! When shared builds are disabled, every configuration whose
//! `<package>:shared` option is `True` is dropped. Everything else, including
//! configurations that do not set the option at all, is kept in order.

use crate::core::configuration::{BuildConfiguration, BuildMatrix};
use crate::core::options::OptionKey;
use crate::util::errors::ConfigError;

/// Result of filtering a matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Configurations to build, in generator order
    pub retained: BuildMatrix,
    /// Configurations that were dropped
    pub removed: BuildMatrix,
}

/// The retention predicate for one package.
#[derive(Debug, Clone)]
pub struct SharedBuildFilter {
    shared_key: OptionKey,
    disabled: bool,
}

impl SharedBuildFilter {
    /// Build a filter for `package`; `disabled` turns shared builds off.
    pub fn new(package: &str, disabled: bool) -> Result<Self, ConfigError> {
        Ok(SharedBuildFilter {
            shared_key: OptionKey::shared(package)?,
            disabled,
        })
    }

    /// Whether shared builds are being removed.
    pub fn is_active(&self) -> bool {
        self.disabled
    }

    /// Keep unless shared builds are disabled and this one is shared.
    pub fn retains(&self, config: &BuildConfiguration) -> bool {
        !(self.disabled && config.is_shared(&self.shared_key))
    }

    /// Apply the predicate once over the matrix.
    pub fn apply(&self, matrix: BuildMatrix) -> FilterOutcome {
        let (retained, removed) = matrix.partition(|c| self.retains(c));

        for config in &removed {
            tracing::debug!(
                "dropping shared configuration {} ({})",
                config.fingerprint(),
                config.describe()
            );
        }

        FilterOutcome { retained, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{matrix_with_shared_flags, shared_flags};

    #[test]
    fn test_disabled_filter_keeps_everything() {
        let flags = [true, false, true, true, false];
        let filter = SharedBuildFilter::new("entt", false).unwrap();
        let outcome = filter.apply(matrix_with_shared_flags("entt", &flags));

        assert_eq!(outcome.retained.len(), 5);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_removes_exactly_the_shared_ones() {
        // Every 5-element on/off pattern: n - k retained, order kept.
        for bits in 0u32..32 {
            let flags: Vec<bool> = (0..5).map(|i| bits & (1 << i) != 0).collect();
            let matrix = matrix_with_shared_flags("entt", &flags);
            let filter = SharedBuildFilter::new("entt", true).unwrap();

            let outcome = filter.apply(matrix.clone());
            let k = flags.iter().filter(|s| **s).count();

            assert_eq!(outcome.retained.len(), flags.len() - k);
            assert_eq!(outcome.removed.len(), k);
            assert!(shared_flags("entt", &outcome.retained).iter().all(|s| !s));

            let expected: Vec<_> = matrix.iter().filter(|c| filter.retains(c)).cloned().collect();
            assert_eq!(outcome.retained, BuildMatrix::from(expected));
        }
    }

    #[test]
    fn test_idempotent() {
        let flags = [true, false, false, true, false, true];
        let filter = SharedBuildFilter::new("entt", true).unwrap();

        let once = filter.apply(matrix_with_shared_flags("entt", &flags)).retained;
        let twice = filter.apply(once.clone());

        assert_eq!(twice.retained, once);
        assert!(twice.removed.is_empty());
    }

    #[test]
    fn test_other_packages_option_is_ignored() {
        let matrix = matrix_with_shared_flags("fmt", &[true, true]);
        let filter = SharedBuildFilter::new("entt", true).unwrap();

        assert_eq!(filter.apply(matrix).retained.len(), 2);
    }

    #[test]
    fn test_missing_option_is_retained() {
        let matrix: BuildMatrix = vec![BuildConfiguration::new(
            crate::core::coordinate::PackageCoordinate::new("entt", "3.2.0"),
        )]
        .into();
        let filter = SharedBuildFilter::new("entt", true).unwrap();

        assert_eq!(filter.apply(matrix).retained.len(), 1);
    }
}
