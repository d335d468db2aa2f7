#![allow(dead_code)]

use std::sync::Arc;

use deploydag::artifact::{Artifact, ArtifactRegistry};
use deploydag::changes::{ChangeDetector, History, IdentityExtractor, MarkerStore};
use deploydag::config::{ChangesSection, ConfigFile, ConfigSection, DeploySection, RawConfigFile};
use deploydag::discovery::Discovery;
use deploydag::errors::Result;
use deploydag::fs::mock::MockFileSystem;
use deploydag::types::{CyclePolicy, FailurePolicy};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                changes: ChangesSection::default(),
                deploy: DeploySection::default(),
            },
        }
    }

    pub fn with_environments(mut self, envs: &[&str]) -> Self {
        self.config.config.environments = envs.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_cmd(mut self, cmd: &str) -> Self {
        self.config.deploy.cmd = Some(cmd.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.deploy.timeout = timeout.to_string();
        self
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.config.config.cycle_policy = policy;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.config.failure_policy = policy;
        self
    }

    pub fn with_config_path(mut self, pattern: &str) -> Self {
        self.config.changes.config_paths.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Discovery that hands out a fixed registry.
pub struct StaticDiscovery {
    registry: ArtifactRegistry,
}

impl StaticDiscovery {
    pub fn new(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        Self {
            registry: artifacts.into_iter().collect(),
        }
    }
}

impl Discovery for StaticDiscovery {
    fn discover(&self) -> Result<ArtifactRegistry> {
        Ok(self.registry.clone())
    }
}

/// Change detector over an in-memory tree rooted at `/repo` with the
/// default artifacts root and config paths.
pub fn detector(
    environment: &str,
    history: impl History + 'static,
    markers: impl MarkerStore + 'static,
    fs: MockFileSystem,
) -> ChangeDetector {
    let cfg = ConfigFileBuilder::new().build();
    let extractor = IdentityExtractor::new(Arc::new(fs), "/repo", cfg.config.artifacts_root.clone());
    ChangeDetector::new(
        environment,
        Box::new(history),
        Box::new(markers),
        extractor,
        &cfg.config_paths_for(environment),
    )
    .expect("default config paths compile")
}
