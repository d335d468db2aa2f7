// src/engine/context.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::artifact::ArtifactId;

/// Per-run state handed to every deploy call.
///
/// Lives for exactly one run; nothing in it survives into the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub environment: String,
    pub run_started: DateTime<Utc>,
    pub dry_run: bool,
    /// Artifacts that did not exist in the target before this run.
    pub created: BTreeSet<ArtifactId>,
}

impl RunContext {
    pub fn new(environment: impl Into<String>, dry_run: bool) -> Self {
        Self {
            environment: environment.into(),
            run_started: Utc::now(),
            dry_run,
            created: BTreeSet::new(),
        }
    }

    pub fn record_created(&mut self, id: &str) {
        self.created.insert(id.to_string());
    }
}
