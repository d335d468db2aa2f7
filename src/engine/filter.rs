// src/engine/filter.rs

//! Narrowing of the discovered registry to the set a run deploys.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::artifact::{Artifact, ArtifactId, ArtifactRegistry};
use crate::changes::{ChangeSet, ChangedArtifacts};
use crate::dag::DependencyGraph;

fn named_in(map: &ChangedArtifacts, artifact: &Artifact) -> bool {
    map.get(&artifact.kind)
        .is_some_and(|names| names.contains(&artifact.name))
}

/// Working set for `change_set`.
///
/// - `DeployAll`: the whole registry.
/// - empty: nothing.
/// - otherwise: artifacts named in `change_set` or `expansion`, plus
///   everything they transitively depend on.
pub fn filter_working_set(
    discovered: &ArtifactRegistry,
    change_set: &ChangeSet,
    expansion: &ChangedArtifacts,
) -> ArtifactRegistry {
    let changed = match change_set {
        ChangeSet::DeployAll(reason) => {
            info!(%reason, artifacts = discovered.len(), "deploying full registry");
            return discovered.clone();
        }
        ChangeSet::Changed(changed) => changed,
    };
    if change_set.is_empty() {
        info!("no artifact changes; nothing to deploy");
        return ArtifactRegistry::new();
    }

    let roots: BTreeSet<&str> = discovered
        .all()
        .filter(|a| named_in(changed, a) || named_in(expansion, a))
        .map(|a| a.id.as_str())
        .collect();

    for (kind, names) in changed {
        for name in names {
            if discovered.by_name(*kind, name).is_none() {
                debug!(kind = %kind, name = %name, "changed artifact not discovered (deleted?)");
            }
        }
    }

    let closure = DependencyGraph::from_registry(discovered).dependency_closure(&roots);
    let mut working = discovered.clone();
    working.retain_ids(&closure);

    info!(
        changed = roots.len(),
        pulled_in = closure.len() - roots.len(),
        total = working.len(),
        "filtered working set to changed artifacts and their dependencies"
    );
    working
}

/// Explicit selection by name or id, with no closure.
///
/// Returns the selected artifacts and the entries that matched nothing.
pub fn select_artifacts(
    discovered: &ArtifactRegistry,
    selection: &[String],
) -> (ArtifactRegistry, Vec<String>) {
    let mut keep: BTreeSet<ArtifactId> = BTreeSet::new();
    let mut unknown = Vec::new();

    for entry in selection.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let matches: Vec<&Artifact> = discovered
            .all()
            .filter(|a| a.id == entry || a.name == entry)
            .collect();
        if matches.is_empty() {
            warn!(artifact = %entry, "requested artifact not found");
            unknown.push(entry.to_string());
        }
        keep.extend(matches.into_iter().map(|a| a.id.clone()));
    }

    let mut working = discovered.clone();
    working.retain_ids(&keep);
    info!(selected = working.len(), "deploying explicitly selected artifacts only");
    (working, unknown)
}
