// src/config/validate.rs

use globset::Glob;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DeployError, Result};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DeployError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let timeout = validate_timeout(&raw.deploy.timeout)?;
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.changes,
            raw.deploy,
            timeout,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_config_paths(cfg)?;
    validate_deploy_section(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.environments.is_empty() {
        return Err(DeployError::ConfigError(
            "[config].environments must list at least one environment".to_string(),
        ));
    }

    if let Some(blank) = cfg.config.environments.iter().find(|e| e.trim().is_empty()) {
        return Err(DeployError::ConfigError(format!(
            "[config].environments contains a blank entry: {blank:?}"
        )));
    }

    if cfg.config.artifacts_root.trim().is_empty() {
        return Err(DeployError::ConfigError(
            "[config].artifacts_root must not be empty".to_string(),
        ));
    }

    if cfg.config.tracking_dir.trim().is_empty() {
        return Err(DeployError::ConfigError(
            "[config].tracking_dir must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_config_paths(cfg: &RawConfigFile) -> Result<()> {
    for pattern in cfg.changes.config_paths.iter() {
        // `{env}` is substituted later; check the pattern with a stand-in.
        let probe = pattern.replace("{env}", "env");
        Glob::new(&probe).map_err(|e| {
            DeployError::ConfigError(format!(
                "[changes].config_paths has invalid pattern '{}': {}",
                pattern, e
            ))
        })?;
    }
    Ok(())
}

fn validate_deploy_section(cfg: &RawConfigFile) -> Result<()> {
    if let Some(cmd) = cfg.deploy.cmd.as_deref() {
        if cmd.trim().is_empty() {
            return Err(DeployError::ConfigError(
                "[deploy].cmd must not be blank".to_string(),
            ));
        }
    }

    for (field, pattern) in [
        ("created_on_stdout", &cfg.deploy.created_on_stdout),
        ("unchanged_on_stdout", &cfg.deploy.unchanged_on_stdout),
    ] {
        if let Some(p) = pattern {
            Regex::new(p).map_err(|e| {
                DeployError::ConfigError(format!("[deploy].{field} is not a valid regex: {e}"))
            })?;
        }
    }

    Ok(())
}

fn validate_timeout(raw: &str) -> Result<std::time::Duration> {
    let timeout = parse_duration(raw)
        .map_err(|e| DeployError::ConfigError(format!("[deploy].timeout: {e}")))?;
    if timeout.is_zero() {
        return Err(DeployError::ConfigError(
            "[deploy].timeout must be greater than zero".to_string(),
        ));
    }
    Ok(timeout)
}
