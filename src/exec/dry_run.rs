// src/exec/dry_run.rs

use tracing::info;

use super::backend::{DeployFuture, DeploySuccess, Deployer};
use crate::artifact::Artifact;
use crate::engine::RunContext;

/// Backend for `--dry-run`: touches nothing and reports every artifact as
/// unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunDeployer;

impl Deployer for DryRunDeployer {
    fn deploy<'a>(&'a mut self, artifact: &'a Artifact, ctx: &'a RunContext) -> DeployFuture<'a> {
        Box::pin(async move {
            info!(
                artifact = %artifact.id,
                environment = %ctx.environment,
                "dry run: would deploy {} ({})",
                artifact.name,
                artifact.kind
            );
            Ok(DeploySuccess::Unchanged)
        })
    }
}
