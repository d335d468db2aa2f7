// src/engine/mod.rs

//! Orchestration engine for deploydag.
//!
//! One run moves through [`RunPhase`]s:
//! `Discovering -> ChangeFiltering -> Resolving -> Deploying -> Completed`,
//! with `Aborted` reachable from `Resolving` (validation or cycle) and from
//! `Deploying` (failure policy `abort`).
//!
//! - [`context`] holds the per-run state threaded through deploy calls.
//! - [`filter`] narrows the discovered registry to the working set.
//! - [`report`] is what a run returns.
//! - [`orchestrator`] drives the phases.

use std::fmt;

pub mod context;
pub mod filter;
pub mod orchestrator;
pub mod report;

pub use context::RunContext;
pub use filter::{filter_working_set, select_artifacts};
pub use orchestrator::{Orchestrator, RunOptions, RunSettings};
pub use report::{ArtifactOutcome, OutcomeStatus, RunReport};

/// State of a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Discovering,
    ChangeFiltering,
    Resolving,
    Deploying,
    Completed,
    Aborted,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Discovering => "discovering",
            RunPhase::ChangeFiltering => "change-filtering",
            RunPhase::Resolving => "resolving",
            RunPhase::Deploying => "deploying",
            RunPhase::Completed => "completed",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
