// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::errors::{DeployError, Result};
use crate::types::{CyclePolicy, FailurePolicy};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// environments = ["dev", "uat", "prod"]
/// artifacts_root = "wsartifacts"
/// cycle_policy = "abort"
/// failure_policy = "continue"
///
/// [changes]
/// config_paths = ["config/{env}.json", "config/common.json"]
///
/// [deploy]
/// cmd = "python scripts/deploy_one.py {environment} {kind} {name}"
/// timeout = "10m"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub changes: ChangesSection,

    #[serde(default)]
    pub deploy: DeploySection,
}

/// Validated configuration. Only constructed via `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub changes: ChangesSection,
    pub deploy: DeploySection,
    /// `deploy.timeout`, parsed.
    pub deploy_timeout: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        changes: ChangesSection,
        deploy: DeploySection,
        deploy_timeout: Duration,
    ) -> Self {
        Self {
            config,
            changes,
            deploy,
            deploy_timeout,
        }
    }

    /// Fail unless `name` is one of the configured environments.
    pub fn ensure_environment(&self, name: &str) -> Result<()> {
        if self.config.environments.iter().any(|e| e == name) {
            Ok(())
        } else {
            Err(DeployError::UnknownEnvironment {
                name: name.to_string(),
                known: self.config.environments.clone(),
            })
        }
    }

    /// Designated configuration paths with `{env}` expanded.
    pub fn config_paths_for(&self, environment: &str) -> Vec<String> {
        self.changes
            .config_paths
            .iter()
            .map(|p| p.replace("{env}", environment))
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Environments the CLI accepts.
    #[serde(default = "default_environments")]
    pub environments: Vec<String>,

    /// Folder (relative to the deployment root) holding artifact definitions.
    #[serde(default = "default_artifacts_root")]
    pub artifacts_root: String,

    /// Folder (relative to the deployment root) holding revision markers.
    #[serde(default = "default_tracking_dir")]
    pub tracking_dir: String,

    #[serde(default)]
    pub cycle_policy: CyclePolicy,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_environments() -> Vec<String> {
    vec!["dev".to_string(), "uat".to_string(), "prod".to_string()]
}

fn default_artifacts_root() -> String {
    "wsartifacts".to_string()
}

fn default_tracking_dir() -> String {
    ".deployment_tracking".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            environments: default_environments(),
            artifacts_root: default_artifacts_root(),
            tracking_dir: default_tracking_dir(),
            cycle_policy: CyclePolicy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// `[changes]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangesSection {
    /// Glob patterns whose change forces a full deployment. `{env}` expands
    /// to the target environment; patterns match at any depth.
    #[serde(default = "default_config_paths")]
    pub config_paths: Vec<String>,
}

fn default_config_paths() -> Vec<String> {
    vec![
        "config/{env}.json".to_string(),
        "config/common.json".to_string(),
    ]
}

impl Default for ChangesSection {
    fn default() -> Self {
        Self {
            config_paths: default_config_paths(),
        }
    }
}

/// `[deploy]` section: the external per-artifact deploy hook.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploySection {
    /// Shell command run once per artifact. Placeholders: `{id}`, `{kind}`,
    /// `{name}`, `{environment}`. Required unless running with `--dry-run`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Upper bound for a single deploy call (e.g. `"90s"`, `"10m"`).
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Regex; a matching stdout line marks the artifact as newly created.
    #[serde(default)]
    pub created_on_stdout: Option<String>,

    /// Regex; a matching stdout line marks the artifact as already up to date.
    #[serde(default)]
    pub unchanged_on_stdout: Option<String>,
}

fn default_timeout() -> String {
    "10m".to_string()
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            cmd: None,
            timeout: default_timeout(),
            created_on_stdout: None,
            unchanged_on_stdout: None,
        }
    }
}
