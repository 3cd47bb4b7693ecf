//! Branch to deployment script mapping, built once from configuration.

use std::collections::{BTreeSet, HashMap};

use crate::error::ConfigError;

pub const PATH_SUFFIX: &str = "_SCRIPT_PATH";
pub const BRANCH_SUFFIX: &str = "_BRANCH_NAME";

/// A named deployment destination bound to one branch and one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub branch_name: String,
    pub script_path: String,
}

/// Immutable lookup tables keyed by branch name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    branch_to_script: HashMap<String, String>,
    branch_to_target: HashMap<String, String>,
}

fn target_names<'a>(
    config: &'a HashMap<String, String>,
    suffix: &str,
) -> BTreeSet<&'a str> {
    config
        .keys()
        .filter_map(|key| key.strip_suffix(suffix))
        .collect()
}

fn required<'a>(
    config: &'a HashMap<String, String>,
    key: String,
) -> Result<&'a str, ConfigError> {
    match config.get(&key) {
        Some(value) if !value.trim().is_empty() => Ok(value.as_str()),
        _ => Err(ConfigError::EmptyValue { key }),
    }
}

impl Registry {
    /// Builds the registry from `<TARGET>_BRANCH_NAME` / `<TARGET>_SCRIPT_PATH` pairs.
    ///
    /// Keys with neither suffix are ignored, so the whole process environment
    /// can be passed in.
    pub fn build(config: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let branch_targets = target_names(config, BRANCH_SUFFIX);
        let path_targets = target_names(config, PATH_SUFFIX);

        if branch_targets != path_targets {
            return Err(ConfigError::MismatchedTargets {
                branch_only: branch_targets
                    .difference(&path_targets)
                    .map(|s| s.to_string())
                    .collect(),
                path_only: path_targets
                    .difference(&branch_targets)
                    .map(|s| s.to_string())
                    .collect(),
            });
        }

        let mut targets = Vec::with_capacity(branch_targets.len());
        for name in branch_targets {
            targets.push(Target {
                name: name.to_string(),
                branch_name: required(config, format!("{name}{BRANCH_SUFFIX}"))?.to_string(),
                script_path: required(config, format!("{name}{PATH_SUFFIX}"))?.to_string(),
            });
        }

        Self::from_targets(targets)
    }

    /// Builds the registry from already resolved targets.
    pub fn from_targets(targets: impl IntoIterator<Item = Target>) -> Result<Self, ConfigError> {
        let mut registry = Registry::default();
        for target in targets {
            if let Some(first) = registry.branch_to_target.get(&target.branch_name) {
                return Err(ConfigError::DuplicateBranch {
                    branch: target.branch_name,
                    first: first.clone(),
                    second: target.name,
                });
            }
            registry
                .branch_to_script
                .insert(target.branch_name.clone(), target.script_path);
            registry
                .branch_to_target
                .insert(target.branch_name, target.name);
        }
        Ok(registry)
    }

    pub fn script_for(&self, branch: &str) -> Option<&str> {
        self.branch_to_script.get(branch).map(String::as_str)
    }

    pub fn target_for(&self, branch: &str) -> Option<&str> {
        self.branch_to_target.get(branch).map(String::as_str)
    }

    /// Resolves a branch to its full target, if one is mapped.
    pub fn lookup(&self, branch: &str) -> Option<Target> {
        Some(Target {
            name: self.target_for(branch)?.to_string(),
            branch_name: branch.to_string(),
            script_path: self.script_for(branch)?.to_string(),
        })
    }

    /// All mapped targets, ordered by target name.
    pub fn targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self
            .branch_to_target
            .keys()
            .filter_map(|branch| self.lookup(branch))
            .collect();
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        targets
    }

    pub fn len(&self) -> usize {
        self.branch_to_script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branch_to_script.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builds_one_entry_per_target() {
        let config = vars(&[
            ("DEPLOY_BRANCH_NAME", "main"),
            ("DEPLOY_SCRIPT_PATH", "/srv/deploy.sh"),
            ("STAGING_BRANCH_NAME", "dev"),
            ("STAGING_SCRIPT_PATH", "/srv/staging.sh"),
            ("HOME", "/root"),
        ]);

        let registry = Registry::build(&config).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.script_for("main"), Some("/srv/deploy.sh"));
        assert_eq!(registry.target_for("main"), Some("DEPLOY"));
        assert_eq!(registry.script_for("dev"), Some("/srv/staging.sh"));
        assert_eq!(registry.target_for("dev"), Some("STAGING"));
        assert_eq!(registry.script_for("feature"), None);
    }

    #[test]
    fn empty_config_gives_empty_registry() {
        let registry = Registry::build(&vars(&[("PATH", "/usr/bin")])).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn path_without_branch_is_rejected() {
        let config = vars(&[
            ("DEPLOY_BRANCH_NAME", "main"),
            ("DEPLOY_SCRIPT_PATH", "/srv/deploy.sh"),
            ("ORPHAN_SCRIPT_PATH", "/srv/orphan.sh"),
        ]);

        let err = Registry::build(&config).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MismatchedTargets {
                branch_only: vec![],
                path_only: vec!["ORPHAN".to_string()],
            }
        );
    }

    #[test]
    fn branch_without_path_is_rejected() {
        let config = vars(&[("DEPLOY_BRANCH_NAME", "main")]);

        let err = Registry::build(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MismatchedTargets { ref branch_only, .. } if branch_only == &["DEPLOY"]
        ));
    }

    #[test]
    fn empty_values_are_rejected() {
        let config = vars(&[
            ("DEPLOY_BRANCH_NAME", "main"),
            ("DEPLOY_SCRIPT_PATH", "  "),
        ]);

        let err = Registry::build(&config).unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptyValue {
                key: "DEPLOY_SCRIPT_PATH".to_string()
            }
        );
    }

    #[test]
    fn values_are_stored_verbatim() {
        let config = vars(&[
            ("DEPLOY_BRANCH_NAME", " main"),
            ("DEPLOY_SCRIPT_PATH", "/srv/deploy.sh --fast "),
        ]);

        let registry = Registry::build(&config).unwrap();
        assert_eq!(registry.script_for("main"), None);
        assert_eq!(registry.script_for(" main"), Some("/srv/deploy.sh --fast "));
    }

    #[test]
    fn duplicate_branches_are_rejected() {
        let config = vars(&[
            ("A_BRANCH_NAME", "main"),
            ("A_SCRIPT_PATH", "/srv/a.sh"),
            ("B_BRANCH_NAME", "main"),
            ("B_SCRIPT_PATH", "/srv/b.sh"),
        ]);

        let err = Registry::build(&config).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateBranch { ref branch, .. } if branch == "main"));
    }

    #[test]
    fn targets_are_listed_by_name() {
        let config = vars(&[
            ("B_BRANCH_NAME", "dev"),
            ("B_SCRIPT_PATH", "/srv/b.sh"),
            ("A_BRANCH_NAME", "main"),
            ("A_SCRIPT_PATH", "/srv/a.sh"),
        ]);

        let names: Vec<String> = Registry::build(&config)
            .unwrap()
            .targets()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
