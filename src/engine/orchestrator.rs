// src/engine/orchestrator.rs

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info, warn};

use super::filter::{filter_working_set, select_artifacts};
use super::report::{ArtifactOutcome, OutcomeStatus, RunReport};
use super::{RunContext, RunPhase};
use crate::artifact::{Artifact, ArtifactRegistry};
use crate::changes::{ChangeDetector, ChangedArtifacts, Revision};
use crate::config::ConfigFile;
use crate::dag::{DependencyError, DependencyResolver};
use crate::discovery::Discovery;
use crate::errors::{DeployError, Result};
use crate::exec::{DeployFailure, DeploySuccess, Deployer, DryRunDeployer};
use crate::types::{CyclePolicy, FailurePolicy};

const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Policies for one environment.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub environment: String,
    pub cycle_policy: CyclePolicy,
    pub failure_policy: FailurePolicy,
    pub deploy_timeout: Duration,
}

impl RunSettings {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            cycle_policy: CyclePolicy::default(),
            failure_policy: FailurePolicy::default(),
            deploy_timeout: DEFAULT_DEPLOY_TIMEOUT,
        }
    }

    pub fn from_config(cfg: &ConfigFile, environment: &str) -> Self {
        Self {
            environment: environment.to_string(),
            cycle_policy: cfg.config.cycle_policy,
            failure_policy: cfg.config.failure_policy,
            deploy_timeout: cfg.deploy_timeout,
        }
    }
}

/// Caller's choices for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip change detection and deploy everything.
    pub force_all: bool,
    /// Deploy only these names or ids; no change detection, no closure.
    pub selection: Option<Vec<String>>,
    /// Plan only. The plan is walked through [`DryRunDeployer`] instead of
    /// the configured deployer and no marker is written.
    pub dry_run: bool,
}

/// Drives one deployment run through its phases.
pub struct Orchestrator<D: Deployer> {
    settings: RunSettings,
    discovery: Box<dyn Discovery>,
    detector: ChangeDetector,
    deployer: D,
    phase: RunPhase,
}

impl<D: Deployer> Orchestrator<D> {
    pub fn new(
        settings: RunSettings,
        discovery: Box<dyn Discovery>,
        detector: ChangeDetector,
        deployer: D,
    ) -> Self {
        Self {
            settings,
            discovery,
            detector,
            deployer,
            phase: RunPhase::Discovering,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn deployer(&self) -> &D {
        &self.deployer
    }

    fn enter(&mut self, phase: RunPhase, report: &mut RunReport) {
        info!(from = %self.phase, to = %phase, "run phase");
        self.phase = phase;
        report.phase = phase;
    }

    fn abort(&mut self, report: &mut RunReport, reason: String) {
        error!(environment = %self.settings.environment, "aborting run: {reason}");
        report.abort_reason = Some(reason);
        self.enter(RunPhase::Aborted, report);
    }

    /// Execute one run.
    ///
    /// Validation failures, cycles and deploy failures end up in the
    /// report; only infrastructure errors (e.g. discovery I/O) are `Err`.
    pub async fn run(&mut self, options: &RunOptions) -> Result<RunReport> {
        let mut report = RunReport::new(self.settings.environment.clone(), options.dry_run);
        self.phase = RunPhase::Discovering;
        info!(
            environment = %self.settings.environment,
            dry_run = options.dry_run,
            force_all = options.force_all,
            "starting deployment run"
        );

        let discovered = self.discovery.discover()?;

        self.enter(RunPhase::ChangeFiltering, &mut report);
        let (working, revision) = match &options.selection {
            Some(selection) => {
                let (working, unknown) = select_artifacts(&discovered, selection);
                report.unknown_selection = unknown;
                (working, None)
            }
            None => {
                let revision = self.detector.current_revision();
                let change_set = self.detector.compute_change_set(options.force_all);
                let expansion = change_set
                    .changed()
                    .map(|changed| self.detector.expand_dependents(changed, &discovered))
                    .unwrap_or_else(ChangedArtifacts::new);
                let working = filter_working_set(&discovered, &change_set, &expansion);
                report.change_set = Some(change_set);
                (working, revision)
            }
        };

        self.enter(RunPhase::Resolving, &mut report);
        let blocking = self.validate(&discovered, &working);
        if !blocking.is_empty() {
            let err = DeployError::DependencyValidation(blocking.clone());
            report.validation_errors = blocking;
            self.abort(&mut report, err.to_string());
            report.log_summary();
            return Ok(report);
        }

        let order = match DependencyResolver::from_registry(&working)
            .resolve_with_policy(self.settings.cycle_policy)
        {
            Ok(order) => order,
            Err(err @ DeployError::DependencyCycle { .. }) => {
                self.abort(&mut report, err.to_string());
                report.log_summary();
                return Ok(report);
            }
            Err(other) => return Err(other),
        };
        report.planned = order;

        self.enter(RunPhase::Deploying, &mut report);
        let aborted = if options.dry_run {
            deploy_plan(&self.settings, &mut DryRunDeployer, &mut report).await
        } else {
            deploy_plan(&self.settings, &mut self.deployer, &mut report).await
        };
        if aborted {
            self.abort(&mut report, "deployment stopped after first failure".to_string());
        } else {
            self.enter(RunPhase::Completed, &mut report);
        }

        if options.dry_run {
            info!(artifacts = report.planned.len(), "dry run: deployment marker left unchanged");
        } else if options.selection.is_some() {
            info!("explicit selection: deployment marker left unchanged");
        } else if report.is_success() {
            self.persist(revision, &mut report);
        } else {
            warn!(failed = report.failed(), "run not fully successful; deployment marker left unchanged");
        }

        report.log_summary();
        Ok(report)
    }

    /// Dangling dependencies of working-set artifacts. Errors of artifacts
    /// outside the working set are only logged.
    fn validate(&self, discovered: &ArtifactRegistry, working: &ArtifactRegistry) -> Vec<DependencyError> {
        let (blocking, other): (Vec<DependencyError>, Vec<DependencyError>) =
            DependencyResolver::from_registry(discovered)
                .validate_dependencies()
                .into_iter()
                .partition(|err| working.contains(&err.artifact_id));

        if !other.is_empty() {
            let ids: BTreeSet<&str> = other.iter().map(|e| e.artifact_id.as_str()).collect();
            warn!(artifacts = ?ids, "dangling dependencies outside this run's working set");
        }
        blocking
    }

    fn persist(&mut self, revision: Option<Revision>, report: &mut RunReport) {
        let Some(revision) = revision else {
            warn!("current revision unknown; deployment marker not written");
            return;
        };
        match self.detector.persist_deployed_revision(&revision) {
            Ok(marker) => report.persisted_revision = Some(marker.revision),
            Err(err) => {
                warn!(error = %err, "failed to write deployment marker");
                report.marker_error = Some(format!("{err:#}"));
            }
        }
    }
}

/// Deploy `report.planned` in order through `deployer`. Returns true if the
/// failure policy stopped the pass early.
async fn deploy_plan<B: Deployer>(
    settings: &RunSettings,
    deployer: &mut B,
    report: &mut RunReport,
) -> bool {
    let mut ctx = RunContext::new(settings.environment.clone(), report.dry_run);
    let total = report.planned.len();
    let mut stopped = false;

    for (idx, artifact) in report.planned.iter().enumerate() {
        if stopped {
            report.outcomes.push(ArtifactOutcome::new(artifact, OutcomeStatus::Skipped));
            continue;
        }

        info!("[{}/{}] deploying {} ({})", idx + 1, total, artifact.name, artifact.kind);
        let status = match deploy_one(settings.deploy_timeout, deployer, artifact, &ctx).await {
            Ok(success) => {
                if success == DeploySuccess::Created {
                    ctx.record_created(&artifact.id);
                }
                info!(artifact = %artifact.id, %success, "deployed {}", artifact.name);
                OutcomeStatus::Succeeded(success)
            }
            Err(failure) => {
                error!(artifact = %artifact.id, reason = %failure, "failed to deploy {}", artifact.name);
                if settings.failure_policy == FailurePolicy::Abort {
                    stopped = true;
                }
                OutcomeStatus::Failed(failure)
            }
        };
        report.outcomes.push(ArtifactOutcome::new(artifact, status));
    }

    stopped
}

async fn deploy_one<B: Deployer>(
    limit: Duration,
    deployer: &mut B,
    artifact: &Artifact,
    ctx: &RunContext,
) -> std::result::Result<DeploySuccess, DeployFailure> {
    match timeout(limit, deployer.deploy(artifact, ctx)).await {
        Ok(result) => result,
        Err(_) => Err(DeployFailure::timed_out(limit)),
    }
}
