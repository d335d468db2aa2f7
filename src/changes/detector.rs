// src/changes/detector.rs

use std::collections::BTreeSet;
use std::fmt;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};

use super::history::{History, Revision};
use super::layout::IdentityExtractor;
use super::marker::{MarkerStore, RevisionMarker};
use super::rules::{ChangedArtifacts, INVALIDATION_RULES, expand_dependents};
use crate::artifact::ArtifactRegistry;
use crate::errors::{DeployError, Result};

/// Why a run deploys everything instead of a computed subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAllReason {
    Forced,
    HistoryUnavailable,
    NoPriorMarker,
    MarkerUnreadable,
    CurrentRevisionUnknown,
    DiffFailed,
    ConfigChanged,
}

impl fmt::Display for DeployAllReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeployAllReason::Forced => "forced by caller",
            DeployAllReason::HistoryUnavailable => "version history unavailable",
            DeployAllReason::NoPriorMarker => "no previous deployment recorded",
            DeployAllReason::MarkerUnreadable => "deployment marker unreadable",
            DeployAllReason::CurrentRevisionUnknown => "current revision unknown",
            DeployAllReason::DiffFailed => "could not compute changed paths",
            DeployAllReason::ConfigChanged => "global configuration changed",
        };
        f.write_str(s)
    }
}

/// Outcome of change detection for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// Sentinel: skip filtering and deploy the whole registry.
    DeployAll(DeployAllReason),
    /// Changed names per kind. Empty means nothing to deploy.
    Changed(ChangedArtifacts),
}

impl ChangeSet {
    pub fn empty() -> Self {
        ChangeSet::Changed(ChangedArtifacts::new())
    }

    pub fn is_deploy_all(&self) -> bool {
        matches!(self, ChangeSet::DeployAll(_))
    }

    /// True for a non-sentinel set naming no artifact.
    pub fn is_empty(&self) -> bool {
        match self {
            ChangeSet::DeployAll(_) => false,
            ChangeSet::Changed(map) => map.values().all(BTreeSet::is_empty),
        }
    }

    pub fn changed(&self) -> Option<&ChangedArtifacts> {
        match self {
            ChangeSet::DeployAll(_) => None,
            ChangeSet::Changed(map) => Some(map),
        }
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeSet::DeployAll(reason) => write!(f, "deploy all ({reason})"),
            ChangeSet::Changed(map) => {
                let count: usize = map.values().map(BTreeSet::len).sum();
                write!(f, "{count} changed artifact(s)")
            }
        }
    }
}

/// Decides which artifacts a run must deploy, relative to the last
/// successful deployment of one environment.
pub struct ChangeDetector {
    environment: String,
    history: Box<dyn History>,
    markers: Box<dyn MarkerStore>,
    extractor: IdentityExtractor,
    config_paths: GlobSet,
}

impl fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("environment", &self.environment)
            .field("artifacts_root", &self.extractor.artifacts_root())
            .finish_non_exhaustive()
    }
}

impl ChangeDetector {
    /// `config_paths` are glob patterns with `{env}` already expanded; each
    /// matches at any depth below the deployment root.
    pub fn new(
        environment: impl Into<String>,
        history: Box<dyn History>,
        markers: Box<dyn MarkerStore>,
        extractor: IdentityExtractor,
        config_paths: &[String],
    ) -> Result<Self> {
        Ok(Self {
            environment: environment.into(),
            history,
            markers,
            extractor,
            config_paths: build_config_globset(config_paths)?,
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Current history position. Errors are logged and treated as unknown.
    pub fn current_revision(&self) -> Option<Revision> {
        match self.history.current_revision() {
            Ok(rev) => rev,
            Err(err) => {
                warn!(error = %err, "could not determine current revision");
                None
            }
        }
    }

    /// Revision recorded by the last fully successful run.
    pub fn last_deployed_revision(&self) -> anyhow::Result<Option<Revision>> {
        Ok(self
            .markers
            .load(&self.environment)?
            .map(|marker| marker.revision))
    }

    /// Paths changed between `from` and the current revision.
    pub fn changed_paths(&self, from: &str) -> anyhow::Result<Vec<String>> {
        let to = self
            .history
            .current_revision()?
            .ok_or_else(|| anyhow::anyhow!("history has no current revision"))?;
        self.history.diff_paths(from, &to)
    }

    pub fn extract_artifact_identities(&self, paths: &[String]) -> ChangedArtifacts {
        let mut changed = ChangedArtifacts::new();
        for path in paths {
            if let Some((kind, name)) = self.extractor.identify(path) {
                changed.entry(kind).or_default().insert(name);
            }
        }
        changed
    }

    pub fn has_config_change(&self, paths: &[String]) -> bool {
        match paths.iter().find(|p| self.config_paths.is_match(p.as_str())) {
            Some(path) => {
                info!(path = %path, "global configuration changed");
                true
            }
            None => false,
        }
    }

    /// Run the detection ladder. Never fails: any infrastructure problem
    /// falls back to [`ChangeSet::DeployAll`].
    pub fn compute_change_set(&self, force_all: bool) -> ChangeSet {
        if force_all {
            return deploy_all(DeployAllReason::Forced);
        }
        if !self.history.is_available() {
            warn!("version history is not available");
            return deploy_all(DeployAllReason::HistoryUnavailable);
        }

        let last = match self.last_deployed_revision() {
            Ok(Some(rev)) => rev,
            Ok(None) => return deploy_all(DeployAllReason::NoPriorMarker),
            Err(err) => {
                warn!(environment = %self.environment, error = %err, "could not read deployment marker");
                return deploy_all(DeployAllReason::MarkerUnreadable);
            }
        };

        let Some(current) = self.current_revision() else {
            return deploy_all(DeployAllReason::CurrentRevisionUnknown);
        };

        if current == last {
            info!(revision = %current, "no changes since last deployment");
            return ChangeSet::empty();
        }

        let paths = match self.history.diff_paths(&last, &current) {
            Ok(paths) => paths,
            Err(err) => {
                warn!(from = %last, to = %current, error = %err, "diff failed");
                return deploy_all(DeployAllReason::DiffFailed);
            }
        };
        info!(from = %last, to = %current, paths = paths.len(), "changed paths since last deployment");
        if paths.is_empty() {
            return ChangeSet::empty();
        }

        if self.has_config_change(&paths) {
            return deploy_all(DeployAllReason::ConfigChanged);
        }

        let changed = self.extract_artifact_identities(&paths);
        for (kind, names) in &changed {
            info!(kind = %kind, names = ?names, "changed artifacts");
        }
        ChangeSet::Changed(changed)
    }

    /// Extra entries implied by the static invalidation rules.
    pub fn expand_dependents(
        &self,
        changed: &ChangedArtifacts,
        discovered: &ArtifactRegistry,
    ) -> ChangedArtifacts {
        expand_dependents(changed, discovered, INVALIDATION_RULES)
    }

    /// Record `revision` as deployed. Only call after a fully successful run.
    pub fn persist_deployed_revision(&mut self, revision: &str) -> anyhow::Result<RevisionMarker> {
        let marker = RevisionMarker::now(self.environment.clone(), revision);
        self.markers.save(&marker)?;
        Ok(marker)
    }
}

fn deploy_all(reason: DeployAllReason) -> ChangeSet {
    info!(%reason, "deploying all artifacts");
    ChangeSet::DeployAll(reason)
}

fn build_config_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let anchored = format!("**/{}", pattern.trim_start_matches("./").trim_start_matches('/'));
        let glob = Glob::new(&anchored).map_err(|e| {
            DeployError::ConfigError(format!("invalid config path pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| DeployError::ConfigError(format!("building config path matcher: {e}")))?;
    debug!(patterns = ?patterns, "compiled config path patterns");
    Ok(set)
}
