// src/exec/backend.rs

//! Pluggable deploy backend abstraction.
//!
//! The orchestrator talks to a [`Deployer`] instead of spawning processes
//! itself. Production code uses [`super::CommandDeployer`]; tests provide a
//! fake that records calls and returns scripted outcomes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::artifact::Artifact;
use crate::engine::RunContext;

/// How a successful deploy call turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploySuccess {
    /// Updated (or idempotently re-applied) an existing artifact.
    Deployed,
    /// Artifact did not exist in the target before this call.
    Created,
    /// Target was already up to date.
    Unchanged,
}

impl fmt::Display for DeploySuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeploySuccess::Deployed => "deployed",
            DeploySuccess::Created => "created",
            DeploySuccess::Unchanged => "unchanged",
        })
    }
}

/// Why a deploy call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployFailure {
    pub reason: String,
    /// Process exit code, when the backend ran a process that exited.
    pub exit_code: Option<i32>,
}

impl DeployFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            exit_code: None,
        }
    }

    pub fn exited(code: Option<i32>, detail: Option<String>) -> Self {
        let status = code.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
        let reason = match detail {
            Some(d) => format!("{status}: {d}"),
            None => status,
        };
        Self {
            reason,
            exit_code: code,
        }
    }

    pub fn timed_out(after: Duration) -> Self {
        Self::new(format!("timed out after {after:?}"))
    }
}

impl fmt::Display for DeployFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

pub type DeployResult = std::result::Result<DeploySuccess, DeployFailure>;

/// Boxed future returned by [`Deployer::deploy`].
pub type DeployFuture<'a> = Pin<Box<dyn Future<Output = DeployResult> + Send + 'a>>;

/// Per-artifact deploy operation.
///
/// Implementations must be idempotent: the orchestrator calls `deploy` for
/// unchanged dependencies that were pulled into the plan.
pub trait Deployer: Send {
    fn deploy<'a>(&'a mut self, artifact: &'a Artifact, ctx: &'a RunContext) -> DeployFuture<'a>;
}
