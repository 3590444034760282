//! Implementation of the packaging pipeline.
//!
//! `plan_builds` resolves the coordinate, generates the matrix and applies
//! the shared-build filter. `run_builds` hands a plan to a runner.

use anyhow::Result;
use serde_json::json;

use crate::core::configuration::BuildMatrix;
use crate::core::coordinate::PackageCoordinate;
use crate::matrix::{GenerationMode, MatrixGenerator, SharedBuildFilter};
use crate::ops::resolve::resolve_coordinate;
use crate::runner::{BuildRunner, RunJob, RunReport, UploadPolicy};
use crate::util::config::PackagerConfig;

/// A resolved coordinate plus the filtered matrix to build.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub coordinate: PackageCoordinate,
    pub mode: GenerationMode,
    /// Configurations to build, in generator order
    pub matrix: BuildMatrix,
    /// Configurations dropped by the shared-build filter
    pub removed: BuildMatrix,
    /// Whether the shared-build filter was active
    pub shared_disabled: bool,
}

impl BuildPlan {
    /// Number of configurations the generator produced.
    pub fn generated(&self) -> usize {
        self.matrix.len() + self.removed.len()
    }

    /// Machine-readable form of the plan.
    pub fn to_json(&self) -> serde_json::Value {
        let entries = |matrix: &BuildMatrix| {
            matrix
                .iter()
                .map(|c| {
                    json!({
                        "id": c.fingerprint(),
                        "settings": c.settings,
                        "options": c.options,
                        "env_vars": c.env_vars,
                        "build_requires": c.build_requires,
                    })
                })
                .collect::<Vec<_>>()
        };

        json!({
            "reference": self.coordinate.reference(),
            "full_reference": self.coordinate.full_reference(),
            "channel": self.coordinate.channel(),
            "mode": match self.mode {
                GenerationMode::CommonBuilds { pure_c: false } => "common",
                GenerationMode::CommonBuilds { pure_c: true } => "common-pure-c",
                GenerationMode::Single => "single",
            },
            "shared_disabled": self.shared_disabled,
            "generated": self.generated(),
            "builds": entries(&self.matrix),
            "removed": entries(&self.removed),
        })
    }
}

/// Resolve, generate and filter.
///
/// Fails with a configuration error before anything is generated when the
/// coordinate cannot be resolved.
pub fn plan_builds(config: &PackagerConfig, generator: &dyn MatrixGenerator) -> Result<BuildPlan> {
    let coordinate = resolve_coordinate(config)?;
    let filter = SharedBuildFilter::new(coordinate.name(), config.disable_shared)?;

    let mode = GenerationMode::select(config.header_only, config.pure_c);
    let generated = generator.generate(&coordinate, mode)?;
    let generated_count = generated.len();

    let outcome = filter.apply(generated);

    tracing::info!(
        "{}: {} of {} configuration(s) retained",
        coordinate,
        outcome.retained.len(),
        generated_count
    );

    Ok(BuildPlan {
        coordinate,
        mode,
        matrix: outcome.retained,
        removed: outcome.removed,
        shared_disabled: filter.is_active(),
    })
}

/// Hand a plan to the runner.
pub fn run_builds(
    config: &PackagerConfig,
    plan: &BuildPlan,
    runner: &dyn BuildRunner,
    branch: Option<&str>,
) -> Result<RunReport> {
    let upload = UploadPolicy::from_config(config)?;

    let job = RunJob {
        coordinate: &plan.coordinate,
        matrix: &plan.matrix,
        test_folder: &config.test_folder,
        upload: &upload,
        branch,
    };

    runner.run(&job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::core::options::OptionSet;
    use crate::matrix::{DefaultGenerator, MatrixAxes};
    use crate::runner::UploadOutcome;
    use crate::test_support::{env_map, shared_flags};
    use crate::util::config::FileConfig;
    use crate::util::errors::ConfigError;

    fn config(pairs: &[(&str, &str)]) -> PackagerConfig {
        PackagerConfig::load(&env_map(pairs), &FileConfig::default()).unwrap()
    }

    fn generator() -> DefaultGenerator {
        DefaultGenerator::new(MatrixAxes {
            archs: vec!["x86_64".into()],
            build_types: vec!["Release".into(), "Debug".into()],
            gcc_versions: vec!["9".into()],
            clang_versions: Vec::new(),
            options: OptionSet::new(),
        })
    }

    /// Records the jobs it receives.
    #[derive(Default)]
    struct RecordingRunner {
        seen: RefCell<Vec<(String, usize, Option<String>)>>,
    }

    impl BuildRunner for RecordingRunner {
        fn run(&self, job: &RunJob<'_>) -> Result<RunReport> {
            self.seen.borrow_mut().push((
                job.coordinate.reference(),
                job.matrix.len(),
                job.branch.map(str::to_string),
            ));
            Ok(RunReport {
                built: job.matrix.len(),
                failed: None,
                upload: UploadOutcome::Skipped {
                    reason: "recording".into(),
                },
                exit_code: 0,
            })
        }
    }

    #[test]
    fn test_plan_keeps_shared_builds_by_default() {
        let plan = plan_builds(
            &config(&[
                ("CONAN_PACKAGE_NAME", "entt"),
                ("TRAVIS_TAG", "v3.2.0"),
                ("CONAN_HEADER_ONLY", "False"),
            ]),
            &generator(),
        )
        .unwrap();

        assert_eq!(plan.generated(), 4);
        assert_eq!(plan.matrix.len(), 4);
        assert!(plan.removed.is_empty());
        assert!(!plan.shared_disabled);
    }

    #[test]
    fn test_plan_drops_shared_builds() {
        let plan = plan_builds(
            &config(&[
                ("CONAN_PACKAGE_NAME", "entt"),
                ("TRAVIS_TAG", "refs/tags/v3.2.0"),
                ("CONAN_HEADER_ONLY", "False"),
                ("CONAN_DISABLE_SHARED_BUILD", "True"),
            ]),
            &generator(),
        )
        .unwrap();

        assert_eq!(plan.coordinate.reference(), "entt/3.2.0");
        assert_eq!(plan.generated(), 4);
        assert_eq!(plan.matrix.len(), 2);
        assert_eq!(shared_flags("entt", &plan.matrix), vec![false, false]);
        assert_eq!(shared_flags("entt", &plan.removed), vec![true, true]);

        let build_types: Vec<_> = plan
            .matrix
            .iter()
            .map(|c| c.settings.build_type().unwrap())
            .collect();
        assert_eq!(build_types, vec!["Release", "Debug"]);
    }

    #[test]
    fn test_plan_header_only_is_single() {
        let plan = plan_builds(
            &config(&[
                ("CONAN_PACKAGE_NAME", "entt"),
                ("TRAVIS_TAG", "v3.2.0"),
                ("CONAN_HEADER_ONLY", "true"),
            ]),
            &generator(),
        )
        .unwrap();

        assert_eq!(plan.mode, GenerationMode::Single);
        assert_eq!(plan.matrix.len(), 1);
    }

    #[test]
    fn test_plan_without_header_only_flag_is_single() {
        let plan = plan_builds(
            &config(&[("CONAN_PACKAGE_NAME", "entt"), ("TRAVIS_TAG", "v3.2.0")]),
            &generator(),
        )
        .unwrap();

        assert_eq!(plan.mode, GenerationMode::Single);
        assert_eq!(plan.generated(), 1);
        assert_eq!(plan.to_json()["mode"], "single");
    }

    #[test]
    fn test_plan_fails_before_generation() {
        let err = plan_builds(
            &config(&[("TRAVIS_TAG", "v3.2.0"), ("CONAN_DISABLE_SHARED_BUILD", "True")]),
            &generator(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::SharedFilterNeedsName)
        ));
    }

    #[test]
    fn test_plan_json() {
        let plan = plan_builds(
            &config(&[
                ("CONAN_PACKAGE_NAME", "entt"),
                ("TRAVIS_TAG", "v3.2.0"),
                ("CONAN_HEADER_ONLY", "no"),
                ("CONAN_DISABLE_SHARED_BUILD", "yes"),
            ]),
            &generator(),
        )
        .unwrap();

        let json = plan.to_json();
        assert_eq!(json["reference"], "entt/3.2.0");
        assert_eq!(json["mode"], "common");
        assert_eq!(json["generated"], 4);
        assert_eq!(json["builds"].as_array().unwrap().len(), 2);
        assert_eq!(json["builds"][0]["options"]["entt:shared"], "False");
        assert_eq!(json["removed"][0]["options"]["entt:shared"], "True");
    }

    #[test]
    fn test_run_hands_filtered_matrix_to_runner() {
        let config = config(&[
            ("CONAN_PACKAGE_NAME", "entt"),
            ("TRAVIS_TAG", "v3.2.0"),
            ("CONAN_HEADER_ONLY", "False"),
            ("CONAN_DISABLE_SHARED_BUILD", "True"),
        ]);
        let plan = plan_builds(&config, &generator()).unwrap();
        let runner = RecordingRunner::default();

        let report = run_builds(&config, &plan, &runner, Some("v3.2.0")).unwrap();

        assert_eq!(report.built, 2);
        assert_eq!(
            runner.seen.borrow().as_slice(),
            &[("entt/3.2.0".to_string(), 2, Some("v3.2.0".to_string()))]
        );
    }
}
