mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use common::{ARTIFACTS, sample_workspace};
use deploydag::artifact::{Artifact, ArtifactKind};
use deploydag::changes::{ChangeSet, DeployAllReason, MemoryMarkerStore};
use deploydag::discovery::FsDiscovery;
use deploydag::engine::{Orchestrator, OutcomeStatus, RunOptions, RunPhase, RunSettings};
use deploydag::exec::DeploySuccess;
use deploydag::fs::mock::MockFileSystem;
use deploydag::types::{CyclePolicy, FailurePolicy};
use deploydag_test_utils::builders::{StaticDiscovery, detector};
use deploydag_test_utils::fake_deployer::FakeDeployer;
use deploydag_test_utils::fake_history::FakeHistory;
use deploydag_test_utils::{init_tracing, with_timeout};

fn chain() -> Vec<Artifact> {
    vec![
        Artifact::with_default_id(ArtifactKind::Lakehouse, "E"),
        Artifact::with_default_id(ArtifactKind::Notebook, "D").depends_on(["lakehouse-E"]),
        Artifact::with_default_id(ArtifactKind::DataPipeline, "P").depends_on(["notebook-D"]),
    ]
}

fn orchestrator(
    settings: RunSettings,
    artifacts: Vec<Artifact>,
    history: FakeHistory,
    markers: MemoryMarkerStore,
    deployer: FakeDeployer,
) -> Orchestrator<FakeDeployer> {
    let d = detector(&settings.environment, history, markers, MockFileSystem::new());
    Orchestrator::new(settings, Box::new(StaticDiscovery::new(artifacts)), d, deployer)
}

#[tokio::test]
async fn full_deploy_persists_marker() {
    init_tracing();
    let markers = MemoryMarkerStore::new();
    let deployer = FakeDeployer::new();
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        chain(),
        FakeHistory::at("rev-2"),
        markers.clone(),
        deployer.clone(),
    );

    let report = with_timeout(orch.run(&RunOptions::default())).await.unwrap();

    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(
        report.change_set,
        Some(ChangeSet::DeployAll(DeployAllReason::NoPriorMarker))
    );
    assert_eq!(deployer.deployed(), vec!["lakehouse-E", "notebook-D", "pipeline-P"]);
    assert!(report.is_success());
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.persisted_revision.as_deref(), Some("rev-2"));
    assert_eq!(markers.revision("dev").as_deref(), Some("rev-2"));
}

#[tokio::test]
async fn only_changed_artifact_and_its_dependency_are_deployed() {
    init_tracing();
    let fs = sample_workspace();
    let history = FakeHistory::at("new").with_changed(&["wsartifacts/Notebooks/Load.ipynb"]);
    let markers = MemoryMarkerStore::new().with_marker("dev", "old");
    let deployer = FakeDeployer::new();

    let d = detector("dev", history, markers.clone(), fs.clone());
    let discovery = FsDiscovery::new(Arc::new(fs), ARTIFACTS);
    let mut orch = Orchestrator::new(RunSettings::new("dev"), Box::new(discovery), d, deployer.clone());

    let report = with_timeout(orch.run(&RunOptions::default())).await.unwrap();

    // The lakehouse did not change but is required by the notebook.
    assert_eq!(deployer.deployed(), vec!["lakehouse-Sales", "notebook-Load"]);
    assert!(report.is_success());
    assert_eq!(markers.revision("dev").as_deref(), Some("new"));
}

#[tokio::test]
async fn unchanged_revision_deploys_nothing_and_succeeds() {
    let deployer = FakeDeployer::new();
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        chain(),
        FakeHistory::at("same"),
        MemoryMarkerStore::new().with_marker("dev", "same"),
        deployer.clone(),
    );

    let report = orch.run(&RunOptions::default()).await.unwrap();
    assert!(deployer.deployed().is_empty());
    assert!(report.planned.is_empty());
    assert!(report.is_success());
}

#[tokio::test]
async fn partial_failure_keeps_previous_marker() {
    init_tracing();
    let markers = MemoryMarkerStore::new().with_marker("dev", "old");
    let deployer = FakeDeployer::new().failing_on("notebook-D");
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        chain(),
        FakeHistory::at("new"),
        markers.clone(),
        deployer.clone(),
    );

    let options = RunOptions {
        force_all: true,
        ..RunOptions::default()
    };
    let report = orch.run(&options).await.unwrap();

    // Best effort: the pipeline is still attempted after the notebook fails.
    assert_eq!(deployer.deployed(), vec!["lakehouse-E", "notebook-D", "pipeline-P"]);
    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 2);
    assert!(!report.is_success());
    assert_eq!(report.persisted_revision, None);
    assert_eq!(markers.revision("dev").as_deref(), Some("old"));
}

#[tokio::test]
async fn abort_policy_skips_the_rest() {
    let mut settings = RunSettings::new("dev");
    settings.failure_policy = FailurePolicy::Abort;
    let deployer = FakeDeployer::new().failing_on("lakehouse-E");
    let mut orch = orchestrator(
        settings,
        chain(),
        FakeHistory::at("new"),
        MemoryMarkerStore::new(),
        deployer.clone(),
    );

    let report = orch.run(&RunOptions::default()).await.unwrap();

    assert_eq!(deployer.deployed(), vec!["lakehouse-E"]);
    assert_eq!(report.phase, RunPhase::Aborted);
    assert_eq!(orch.phase(), RunPhase::Aborted);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.attempted_ids(), vec!["lakehouse-E"]);
}

#[tokio::test]
async fn slow_deploy_times_out_as_failure() {
    let mut settings = RunSettings::new("dev");
    settings.deploy_timeout = Duration::from_millis(50);
    let deployer = FakeDeployer::new().with_delay("notebook-D", Duration::from_secs(5));
    let mut orch = orchestrator(
        settings,
        chain(),
        FakeHistory::at("new"),
        MemoryMarkerStore::new(),
        deployer.clone(),
    );

    let report = with_timeout(orch.run(&RunOptions::default())).await.unwrap();

    match &report.outcome("notebook-D").unwrap().status {
        OutcomeStatus::Failed(failure) => assert!(failure.reason.contains("timed out")),
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert_eq!(deployer.deployed().len(), 3);
    assert!(!report.is_success());
}

#[tokio::test]
async fn dangling_dependency_in_working_set_aborts_before_deploying() {
    init_tracing();
    let mut artifacts = chain();
    artifacts.push(
        Artifact::with_default_id(ArtifactKind::Report, "R").depends_on(["semanticmodel-missing"]),
    );
    let deployer = FakeDeployer::new();
    let markers = MemoryMarkerStore::new();
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        artifacts,
        FakeHistory::at("new"),
        markers.clone(),
        deployer.clone(),
    );

    let report = orch.run(&RunOptions::default()).await.unwrap();

    assert_eq!(report.phase, RunPhase::Aborted);
    assert_eq!(report.validation_errors.len(), 1);
    assert_eq!(report.validation_errors[0].missing_id, "semanticmodel-missing");
    assert!(deployer.deployed().is_empty());
    assert_eq!(markers.revision("dev"), None);
    assert!(!report.is_success());
}

#[tokio::test]
async fn dangling_dependency_outside_working_set_only_warns() {
    let mut artifacts = chain();
    artifacts.push(
        Artifact::with_default_id(ArtifactKind::Report, "R").depends_on(["semanticmodel-missing"]),
    );
    let deployer = FakeDeployer::new();
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        artifacts,
        FakeHistory::at("new"),
        MemoryMarkerStore::new(),
        deployer.clone(),
    );

    let options = RunOptions {
        selection: Some(vec!["D".to_string()]),
        ..RunOptions::default()
    };
    let report = orch.run(&options).await.unwrap();

    assert!(report.validation_errors.is_empty());
    assert_eq!(deployer.deployed(), vec!["notebook-D"]);
    assert!(report.is_success());
    // Explicit selections never advance the marker.
    assert_eq!(report.persisted_revision, None);
}

#[tokio::test]
async fn cycle_aborts_unless_fallback_is_configured() {
    let cyclic = vec![
        Artifact::with_default_id(ArtifactKind::Notebook, "a").depends_on(["lakehouse-b"]),
        Artifact::with_default_id(ArtifactKind::Lakehouse, "b").depends_on(["notebook-a"]),
    ];

    let deployer = FakeDeployer::new();
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        cyclic.clone(),
        FakeHistory::at("new"),
        MemoryMarkerStore::new(),
        deployer.clone(),
    );
    let report = orch.run(&RunOptions::default()).await.unwrap();
    assert_eq!(report.phase, RunPhase::Aborted);
    assert!(report.abort_reason.unwrap().contains("Circular dependency"));
    assert!(deployer.deployed().is_empty());

    let mut settings = RunSettings::new("dev");
    settings.cycle_policy = CyclePolicy::PriorityFallback;
    let deployer = FakeDeployer::new();
    let mut orch = orchestrator(
        settings,
        cyclic,
        FakeHistory::at("new"),
        MemoryMarkerStore::new(),
        deployer.clone(),
    );
    let report = orch.run(&RunOptions::default()).await.unwrap();
    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(deployer.deployed(), vec!["lakehouse-b", "notebook-a"]);
}

#[tokio::test]
async fn dry_run_plans_without_deploying() {
    let deployer = FakeDeployer::new();
    let markers = MemoryMarkerStore::new();
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        chain(),
        FakeHistory::at("new"),
        markers.clone(),
        deployer.clone(),
    );

    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let report = orch.run(&options).await.unwrap();

    let planned: Vec<&str> = report.planned.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(planned, vec!["lakehouse-E", "notebook-D", "pipeline-P"]);
    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(report.attempted_ids(), planned);
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::Succeeded(DeploySuccess::Unchanged))
    );
    assert!(deployer.deployed().is_empty());
    assert_eq!(report.persisted_revision, None);
    assert_eq!(markers.revision("dev"), None);
}

#[tokio::test]
async fn unknown_selection_entry_fails_the_run() {
    let deployer = FakeDeployer::new();
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        chain(),
        FakeHistory::at("new"),
        MemoryMarkerStore::new(),
        deployer.clone(),
    );

    let options = RunOptions {
        selection: Some(vec!["D".to_string(), "Typo".to_string()]),
        ..RunOptions::default()
    };
    let report = orch.run(&options).await.unwrap();

    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(deployer.deployed(), vec!["notebook-D"]);
    assert_eq!(report.unknown_selection, vec!["Typo".to_string()]);
    assert!(!report.is_success());
}

#[tokio::test]
async fn created_artifacts_are_visible_to_later_calls() {
    let deployer = FakeDeployer::new().creating("lakehouse-E");
    let mut orch = orchestrator(
        RunSettings::new("dev"),
        chain(),
        FakeHistory::at("new"),
        MemoryMarkerStore::new(),
        deployer.clone(),
    );

    let report = orch.run(&RunOptions::default()).await.unwrap();

    assert_eq!(
        report.outcome("lakehouse-E").unwrap().status,
        OutcomeStatus::Succeeded(DeploySuccess::Created)
    );
    let seen = deployer.created_sets();
    assert!(seen[0].is_empty());
    assert_eq!(seen[1], BTreeSet::from(["lakehouse-E".to_string()]));
}
