// src/engine/report.rs

use tracing::{error, info, warn};

use super::RunPhase;
use crate::artifact::{Artifact, ArtifactId, ArtifactKind};
use crate::changes::{ChangeSet, Revision};
use crate::dag::DependencyError;
use crate::exec::{DeployFailure, DeploySuccess};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded(DeploySuccess),
    Failed(DeployFailure),
    /// Not attempted because an earlier failure aborted the run.
    Skipped,
}

/// Result of one planned artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub name: String,
    pub status: OutcomeStatus,
}

impl ArtifactOutcome {
    pub fn new(artifact: &Artifact, status: OutcomeStatus) -> Self {
        Self {
            id: artifact.id.clone(),
            kind: artifact.kind,
            name: artifact.name.clone(),
            status,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

/// Everything a run did, returned to the caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub environment: String,
    pub phase: RunPhase,
    pub dry_run: bool,
    /// `None` for explicit `--artifacts` selections.
    pub change_set: Option<ChangeSet>,
    /// Resolved deployment order.
    pub planned: Vec<Artifact>,
    pub outcomes: Vec<ArtifactOutcome>,
    /// Dangling dependencies that blocked the run.
    pub validation_errors: Vec<DependencyError>,
    /// Selection entries that matched no artifact.
    pub unknown_selection: Vec<String>,
    pub abort_reason: Option<String>,
    pub persisted_revision: Option<Revision>,
    /// Set when the deployment succeeded but the marker could not be written.
    pub marker_error: Option<String>,
}

impl RunReport {
    pub fn new(environment: impl Into<String>, dry_run: bool) -> Self {
        Self {
            environment: environment.into(),
            phase: RunPhase::Discovering,
            dry_run,
            change_set: None,
            planned: Vec::new(),
            outcomes: Vec::new(),
            validation_errors: Vec::new(),
            unknown_selection: Vec::new(),
            abort_reason: None,
            persisted_revision: None,
            marker_error: None,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Succeeded(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Skipped))
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// Ids in the order they were attempted, failures included.
    pub fn attempted_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status != OutcomeStatus::Skipped)
            .map(|o| o.id.as_str())
            .collect()
    }

    pub fn outcome(&self, id: &str) -> Option<&ArtifactOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    /// Run completed with no failed artifact and every `--artifacts` entry
    /// matched something.
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Completed
            && self.failed() == 0
            && self.validation_errors.is_empty()
            && self.unknown_selection.is_empty()
    }

    pub fn log_summary(&self) {
        info!("{}", "=".repeat(60));
        info!(environment = %self.environment, phase = %self.phase, "deployment summary");
        if let Some(reason) = &self.abort_reason {
            error!("run aborted: {reason}");
        }
        for err in &self.validation_errors {
            error!("  {err}");
        }
        if !self.unknown_selection.is_empty() {
            error!("  unknown artifacts requested: {:?}", self.unknown_selection);
        }
        info!("  total artifacts: {}", self.planned.len());
        info!("  successful: {}", self.succeeded());
        if self.failed() > 0 {
            error!("  failed: {}", self.failed());
            for outcome in self.outcomes.iter().filter(|o| o.is_failure()) {
                if let OutcomeStatus::Failed(failure) = &outcome.status {
                    error!("    {} ({}): {}", outcome.name, outcome.kind, failure);
                }
            }
        } else {
            info!("  failed: 0");
        }
        if self.skipped() > 0 {
            warn!("  skipped: {}", self.skipped());
        }
        if let Some(err) = &self.marker_error {
            warn!("  deployment marker not updated: {err}");
        }
        info!("{}", "=".repeat(60));
    }
}
