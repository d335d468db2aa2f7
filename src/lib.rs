// src/lib.rs

pub mod artifact;
pub mod changes;
pub mod cli;
pub mod config;
pub mod dag;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::changes::{ChangeDetector, FileMarkerStore, GitHistory, IdentityExtractor};
use crate::cli::CliArgs;
use crate::config::{ConfigFile, config_file_pattern, load_and_validate};
use crate::discovery::FsDiscovery;
use crate::engine::{Orchestrator, RunOptions, RunReport, RunSettings};
use crate::exec::{CommandDeployer, DryRunDeployer};
use crate::fs::{FileSystem, RealFileSystem};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and environment check
/// - filesystem discovery
/// - git-backed change detection and the file marker store
/// - the orchestrator with the command (or dry-run) deployer
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    cfg.ensure_environment(&args.environment)?;

    let root = args
        .root
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config_root_dir(&config_path));
    debug!(root = ?root, config = ?config_path, "resolved deployment root");

    let detector = build_detector(&cfg, &config_path, &root, &args.environment)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let discovery = FsDiscovery::new(fs, root.join(&cfg.config.artifacts_root));
    let settings = RunSettings::from_config(&cfg, &args.environment);
    let options = RunOptions {
        force_all: args.force_all,
        selection: args.artifacts.clone(),
        dry_run: args.dry_run,
    };

    let report = if args.dry_run {
        let mut orchestrator =
            Orchestrator::new(settings, Box::new(discovery), detector, DryRunDeployer);
        let report = orchestrator.run(&options).await?;
        print_plan(&report);
        report
    } else {
        let deployer = CommandDeployer::from_config(&cfg.deploy, &root)?;
        let mut orchestrator = Orchestrator::new(settings, Box::new(discovery), detector, deployer);
        orchestrator.run(&options).await?
    };

    Ok(report)
}

fn build_detector(
    cfg: &ConfigFile,
    config_path: &Path,
    root: &Path,
    environment: &str,
) -> Result<ChangeDetector> {
    let mut config_paths = cfg.config_paths_for(environment);
    match config_file_pattern(config_path, root) {
        Some(pattern) => config_paths.push(pattern),
        None => debug!(config = ?config_path, "config file outside the deployment root"),
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let extractor = IdentityExtractor::new(fs, root, cfg.config.artifacts_root.clone());
    let detector = ChangeDetector::new(
        environment,
        Box::new(GitHistory::new(root)),
        Box::new(FileMarkerStore::new(root.join(&cfg.config.tracking_dir))),
        extractor,
        &config_paths,
    )?;
    Ok(detector)
}

/// Directory holding the config file, or the current directory for a bare
/// file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output on stdout: the resolved plan.
fn print_plan(report: &RunReport) {
    println!("deploydag dry-run ({})", report.environment);
    if let Some(change_set) = &report.change_set {
        println!("  change set: {change_set}");
    }
    if let Some(reason) = &report.abort_reason {
        println!("  aborted: {reason}");
        return;
    }
    println!();

    println!("plan ({} artifact(s)):", report.planned.len());
    for (idx, artifact) in report.planned.iter().enumerate() {
        println!("  {:>3}. {} ({})", idx + 1, artifact.name, artifact.kind);
        println!("       id: {}", artifact.id);
        if !artifact.dependencies.is_empty() {
            println!("       depends on: {:?}", artifact.dependencies);
        }
    }
}
