// src/exec/mod.rs

//! Deploy execution layer.
//!
//! - [`backend`] provides the [`Deployer`] trait and the per-artifact
//!   success/failure types that the orchestrator records.
//! - [`command`] runs a configured shell command per artifact using
//!   `tokio::process::Command`.
//! - [`dry_run`] is the backend used when nothing may be touched.

pub mod backend;
pub mod command;
pub mod dry_run;

pub use backend::{DeployFailure, DeployFuture, DeployResult, DeploySuccess, Deployer};
pub use command::CommandDeployer;
pub use dry_run::DryRunDeployer;
