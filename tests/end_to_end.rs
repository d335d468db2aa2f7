#![cfg(unix)]

use std::fs;
use std::path::Path;

use deploydag::changes::{ChangeSet, DeployAllReason};
use deploydag::cli::CliArgs;
use deploydag::engine::RunPhase;
use git2::{Repository, Signature};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn commit_all(repo: &Repository, message: &str) -> String {
    let mut index = repo.index().unwrap();
    index
        .add_all(["wsartifacts", "Deploydag.toml"], git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
        .to_string()
}

fn args(root: &Path) -> CliArgs {
    CliArgs {
        environment: "dev".to_string(),
        config: root.join("Deploydag.toml").to_string_lossy().into_owned(),
        root: None,
        force_all: false,
        artifacts: None,
        dry_run: false,
        log_level: None,
    }
}

fn deployed(root: &Path) -> Vec<String> {
    fs::read_to_string(root.join("deployed.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn second_run_deploys_only_what_changed() {
    deploydag_test_utils::init_tracing();
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "Deploydag.toml", "[deploy]\ncmd = \"echo {id} >> deployed.log\"\n");
    write(root, "wsartifacts/Lakehouses/Sales.json", r#"{"name": "Sales"}"#);
    write(
        root,
        "wsartifacts/Notebooks/Load.ipynb",
        r#"{"metadata": {"dependencies": ["lakehouse-Sales"]}}"#,
    );
    write(root, "wsartifacts/Notebooks/Other.ipynb", r#"{"metadata": {}}"#);
    let first = commit_all(&repo, "initial");

    let report = deploydag::run(args(root)).await.unwrap();
    assert!(report.is_success());
    assert_eq!(
        deployed(root),
        vec!["lakehouse-Sales", "notebook-Load", "notebook-Other"]
    );
    let marker = fs::read_to_string(root.join(".deployment_tracking/dev_last_commit.txt")).unwrap();
    assert_eq!(marker.lines().next(), Some(first.as_str()));

    fs::remove_file(root.join("deployed.log")).unwrap();
    write(
        root,
        "wsartifacts/Notebooks/Load.ipynb",
        r#"{"cells": [1], "metadata": {"dependencies": ["lakehouse-Sales"]}}"#,
    );
    let second = commit_all(&repo, "change notebook");

    let report = deploydag::run(args(root)).await.unwrap();
    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(deployed(root), vec!["lakehouse-Sales", "notebook-Load"]);
    assert_eq!(report.persisted_revision.as_deref(), Some(second.as_str()));
}

#[tokio::test]
async fn editing_the_config_file_redeploys_everything() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "Deploydag.toml", "[deploy]\ncmd = \"echo v1 {id} >> deployed.log\"\n");
    write(root, "wsartifacts/Lakehouses/Sales.json", r#"{"name": "Sales"}"#);
    write(root, "wsartifacts/Notebooks/Load.ipynb", r#"{"metadata": {}}"#);
    commit_all(&repo, "initial");

    let report = deploydag::run(args(root)).await.unwrap();
    assert!(report.is_success());

    fs::remove_file(root.join("deployed.log")).unwrap();
    write(root, "Deploydag.toml", "[deploy]\ncmd = \"echo v2 {id} >> deployed.log\"\n");
    let second = commit_all(&repo, "change deploy command");

    let report = deploydag::run(args(root)).await.unwrap();
    assert_eq!(
        report.change_set,
        Some(ChangeSet::DeployAll(DeployAllReason::ConfigChanged))
    );
    assert_eq!(deployed(root), vec!["v2 lakehouse-Sales", "v2 notebook-Load"]);
    assert_eq!(report.persisted_revision.as_deref(), Some(second.as_str()));
}

#[tokio::test]
async fn failing_command_exits_unsuccessfully_and_keeps_marker_absent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "Deploydag.toml", "[deploy]\ncmd = \"test {name} != Broken\"\n");
    write(root, "wsartifacts/Lakehouses/Broken.json", "{}");
    write(root, "wsartifacts/Lakehouses/Fine.json", "{}");
    commit_all(&repo, "initial");

    let report = deploydag::run(args(root)).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failed(), 1);
    assert!(!root.join(".deployment_tracking/dev_last_commit.txt").exists());
}

#[tokio::test]
async fn unknown_environment_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Deploydag.toml", "");
    let mut a = args(dir.path());
    a.environment = "staging".to_string();

    assert!(deploydag::run(a).await.is_err());
}
