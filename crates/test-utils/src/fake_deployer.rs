use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deploydag::artifact::Artifact;
use deploydag::engine::RunContext;
use deploydag::exec::{DeployFailure, DeployFuture, DeploySuccess, Deployer};

/// A fake deployer that:
/// - records which artifacts were deployed, in call order
/// - records the `created` set of the run context it was handed
/// - fails, reports `Created`, or sleeps for artifacts configured to do so.
#[derive(Clone, Default)]
pub struct FakeDeployer {
    deployed: Arc<Mutex<Vec<String>>>,
    seen_created: Arc<Mutex<Vec<BTreeSet<String>>>>,
    failing: BTreeSet<String>,
    creating: BTreeSet<String>,
    delays: BTreeMap<String, Duration>,
}

impl FakeDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn creating(mut self, id: &str) -> Self {
        self.creating.insert(id.to_string());
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    /// Handle on the call log; stays valid after the deployer is moved.
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.deployed)
    }

    pub fn deployed(&self) -> Vec<String> {
        self.deployed.lock().unwrap().clone()
    }

    /// `ctx.created` as observed by each call, in call order.
    pub fn created_sets(&self) -> Vec<BTreeSet<String>> {
        self.seen_created.lock().unwrap().clone()
    }
}

impl Deployer for FakeDeployer {
    fn deploy<'a>(&'a mut self, artifact: &'a Artifact, ctx: &'a RunContext) -> DeployFuture<'a> {
        Box::pin(async move {
            self.deployed.lock().unwrap().push(artifact.id.clone());
            self.seen_created.lock().unwrap().push(ctx.created.clone());

            if let Some(delay) = self.delays.get(&artifact.id) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.contains(&artifact.id) {
                return Err(DeployFailure::new(format!("injected failure for {}", artifact.id)));
            }
            if self.creating.contains(&artifact.id) {
                Ok(DeploySuccess::Created)
            } else {
                Ok(DeploySuccess::Deployed)
            }
        })
    }
}
