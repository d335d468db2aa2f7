mod common;

use std::sync::Arc;

use common::{ARTIFACTS, sample_workspace};
use deploydag::artifact::ArtifactKind;
use deploydag::discovery::{Discovery, FsDiscovery};
use deploydag::fs::mock::MockFileSystem;
use deploydag_test_utils::init_tracing;

fn discover(fs: MockFileSystem) -> deploydag::artifact::ArtifactRegistry {
    FsDiscovery::new(Arc::new(fs), ARTIFACTS)
        .discover()
        .expect("discovery over mock fs")
}

#[test]
fn discovers_every_layout() {
    init_tracing();
    let registry = discover(sample_workspace());

    let ids: Vec<&str> = registry.ids().collect();
    assert_eq!(
        ids,
        vec![
            "env-spark",
            "lakehouse-Sales",
            "notebook-Load",
            "report-Overview",
            "report-Standalone",
            "semanticmodel-Finance Model",
            "view-Sales-daily",
            "view-Sales-weekly",
        ]
    );

    let model = registry.by_id("semanticmodel-Finance Model").unwrap();
    assert_eq!(model.kind, ArtifactKind::SemanticModel);
    assert!(model.dependencies.contains("lakehouse-Sales"));

    let env = registry.by_id("env-spark").unwrap();
    assert_eq!(env.kind, ArtifactKind::Environment);
    assert_eq!(env.name, "Spark");
}

#[test]
fn views_depend_on_their_lakehouse_and_declared_views() {
    let registry = discover(sample_workspace());

    let daily = registry.by_id("view-Sales-daily").unwrap();
    assert_eq!(daily.dependencies.iter().collect::<Vec<_>>(), vec!["lakehouse-Sales"]);

    let weekly = registry.by_id("view-Sales-weekly").unwrap();
    assert!(weekly.dependencies.contains("lakehouse-Sales"));
    assert!(weekly.dependencies.contains("view-Sales-daily"));
    assert_eq!(weekly.dependencies.len(), 2);
}

#[test]
fn notebook_file_wins_over_folder_twin() {
    let registry = discover(sample_workspace());

    let notebooks = registry.by_type(ArtifactKind::Notebook);
    assert_eq!(notebooks.len(), 1);
    assert!(notebooks[0].dependencies.contains("lakehouse-Sales"));
}

#[test]
fn malformed_definitions_are_skipped() {
    let fs = sample_workspace();
    fs.add_file(format!("{ARTIFACTS}/Lakehouses/Broken.json"), "{ not json");
    fs.add_file(format!("{ARTIFACTS}/Reports/Bad/.platform"), "not json at all");
    fs.add_dir(format!("{ARTIFACTS}/Reports/NoDescriptor"));

    let registry = discover(fs);

    assert!(registry.by_name(ArtifactKind::Lakehouse, "Broken").is_none());
    assert!(registry.by_name(ArtifactKind::Report, "Bad").is_none());
    assert!(registry.by_name(ArtifactKind::Report, "NoDescriptor").is_none());
    assert!(registry.contains("lakehouse-Sales"));
}

#[test]
fn missing_artifacts_dir_yields_empty_registry() {
    let registry = discover(MockFileSystem::new());
    assert!(registry.is_empty());
}
