//! Upload policy and branch detection.
//!
//! Uploads happen only when a target is configured and, if
//! `upload_only_when_stable` is set, the current branch matches the
//! stable-branch pattern.

use std::path::Path;

use regex::Regex;

use crate::util::config::{EnvSource, PackagerConfig};
use crate::util::errors::ConfigError;

/// CI variables that name the branch (or tag) being built, in lookup order.
const BRANCH_VARS: &[&str] = &[
    "TRAVIS_BRANCH",
    "APPVEYOR_REPO_BRANCH",
    "CI_COMMIT_REF_NAME",
    "GITHUB_REF",
];

/// Decides whether a finished run is uploaded.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    target: Option<String>,
    only_when_stable: bool,
    stable_pattern: Regex,
}

/// Outcome of [`UploadPolicy::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDecision {
    Upload { target: String },
    Skip { reason: String },
}

impl UploadPolicy {
    pub fn new(target: Option<String>, only_when_stable: bool, stable_pattern: Regex) -> Self {
        UploadPolicy {
            target,
            only_when_stable,
            stable_pattern,
        }
    }

    pub fn from_config(config: &PackagerConfig) -> Result<Self, ConfigError> {
        Ok(UploadPolicy::new(
            config.upload.clone(),
            config.upload_only_when_stable,
            config.stable_branch_regex()?,
        ))
    }

    /// Whether `branch` counts as a stable branch.
    pub fn is_stable(&self, branch: Option<&str>) -> bool {
        branch.is_some_and(|b| self.stable_pattern.is_match(b))
    }

    pub fn decide(&self, branch: Option<&str>) -> UploadDecision {
        let Some(ref target) = self.target else {
            return UploadDecision::Skip {
                reason: "no upload target configured".to_string(),
            };
        };

        if self.only_when_stable && !self.is_stable(branch) {
            return UploadDecision::Skip {
                reason: match branch {
                    Some(b) => format!("branch `{}` is not a stable branch", b),
                    None => "current branch is unknown".to_string(),
                },
            };
        }

        UploadDecision::Upload {
            target: target.clone(),
        }
    }
}

/// Find the branch being built.
///
/// CI variables win; otherwise the HEAD of the git repository containing
/// `repo_dir` is used.
pub fn detect_branch(env: &dyn EnvSource, repo_dir: &Path) -> Option<String> {
    for var in BRANCH_VARS {
        let Some(value) = env.var(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let value = value.trim();
        let branch = value
            .strip_prefix("refs/heads/")
            .or_else(|| value.strip_prefix("refs/tags/"))
            .unwrap_or(value);
        tracing::debug!("branch `{}` from {}", branch, var);
        return Some(branch.to_string());
    }

    git_head_branch(repo_dir)
}

fn git_head_branch(repo_dir: &Path) -> Option<String> {
    let repo = git2::Repository::discover(repo_dir).ok()?;
    let head = repo.head().ok()?;
    if !head.is_branch() {
        return None;
    }
    let branch = head.shorthand()?.to_string();
    tracing::debug!("branch `{}` from git HEAD", branch);
    Some(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env_map;
    use tempfile::TempDir;

    fn policy(target: Option<&str>, only_when_stable: bool) -> UploadPolicy {
        let config = PackagerConfig {
            upload: target.map(str::to_string),
            upload_only_when_stable: only_when_stable,
            ..PackagerConfig::default()
        };
        UploadPolicy::from_config(&config).unwrap()
    }

    #[test]
    fn test_no_target_skips() {
        assert!(matches!(
            policy(None, false).decide(Some("v1.0.0")),
            UploadDecision::Skip { .. }
        ));
    }

    #[test]
    fn test_stable_branch_uploads() {
        assert_eq!(
            policy(Some("bintray"), true).decide(Some("v3.2.0")),
            UploadDecision::Upload {
                target: "bintray".into()
            }
        );
    }

    #[test]
    fn test_unstable_branch_skips() {
        let decision = policy(Some("bintray"), true).decide(Some("master"));
        assert_eq!(
            decision,
            UploadDecision::Skip {
                reason: "branch `master` is not a stable branch".into()
            }
        );

        assert!(matches!(
            policy(Some("bintray"), true).decide(None),
            UploadDecision::Skip { .. }
        ));
    }

    #[test]
    fn test_any_branch_when_not_gated() {
        assert!(matches!(
            policy(Some("bintray"), false).decide(Some("feature/x")),
            UploadDecision::Upload { .. }
        ));
    }

    #[test]
    fn test_detect_branch_from_ci_vars() {
        let tmp = TempDir::new().unwrap();

        let env = env_map(&[("TRAVIS_BRANCH", "v3.2.0"), ("GITHUB_REF", "refs/heads/master")]);
        assert_eq!(detect_branch(&env, tmp.path()).as_deref(), Some("v3.2.0"));

        let env = env_map(&[("GITHUB_REF", "refs/heads/master")]);
        assert_eq!(detect_branch(&env, tmp.path()).as_deref(), Some("master"));

        let env = env_map(&[("TRAVIS_BRANCH", ""), ("GITHUB_REF", "refs/tags/v3.2.0")]);
        assert_eq!(detect_branch(&env, tmp.path()).as_deref(), Some("v3.2.0"));
    }

    #[test]
    fn test_detect_branch_from_git() {
        let tmp = TempDir::new().unwrap();
        let repo = git2::Repository::init(tmp.path()).unwrap();

        // An unborn HEAD has no branch to report yet.
        {
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[]).unwrap();
        }
        let head = repo.head().unwrap().shorthand().unwrap().to_string();

        assert_eq!(detect_branch(&env_map(&[]), tmp.path()), Some(head));
    }

    #[test]
    fn test_detect_branch_outside_repo() {
        let tmp = TempDir::new().unwrap();
        // tempdirs normally live outside any repository
        if git2::Repository::discover(tmp.path()).is_err() {
            assert_eq!(detect_branch(&env_map(&[]), tmp.path()), None);
        }
    }
}
