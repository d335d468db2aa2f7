// src/artifact/registry.rs

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::artifact::{Artifact, ArtifactId, ArtifactKind};

/// In-memory collection of artifact records keyed by id.
///
/// Id uniqueness is the caller's responsibility: `add` silently overwrites.
/// Names are not unique across kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<ArtifactId, Artifact>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by id. Returns the record that was replaced.
    pub fn add(&mut self, artifact: Artifact) -> Option<Artifact> {
        debug!(id = %artifact.id, kind = %artifact.kind, name = %artifact.name, "registered artifact");
        self.artifacts.insert(artifact.id.clone(), artifact)
    }

    /// Current working set, ordered by id.
    pub fn all(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn by_type(&self, kind: ArtifactKind) -> Vec<&Artifact> {
        self.artifacts.values().filter(|a| a.kind == kind).collect()
    }

    pub fn by_id(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    pub fn by_name(&self, kind: ArtifactKind, name: &str) -> Option<&Artifact> {
        self.artifacts
            .values()
            .find(|a| a.kind == kind && a.name == name)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.artifacts.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn clear(&mut self) {
        self.artifacts.clear();
    }

    /// Keep only the artifacts whose id is in `keep`.
    pub fn retain_ids(&mut self, keep: &BTreeSet<ArtifactId>) {
        self.artifacts.retain(|id, _| keep.contains(id));
    }

    /// Discovered names grouped by kind, the shape dependent expansion works on.
    pub fn names_by_kind(&self) -> BTreeMap<ArtifactKind, BTreeSet<String>> {
        let mut map: BTreeMap<ArtifactKind, BTreeSet<String>> = BTreeMap::new();
        for a in self.artifacts.values() {
            map.entry(a.kind).or_default().insert(a.name.clone());
        }
        map
    }
}

impl FromIterator<Artifact> for ArtifactRegistry {
    fn from_iter<T: IntoIterator<Item = Artifact>>(iter: T) -> Self {
        let mut registry = ArtifactRegistry::new();
        for artifact in iter {
            registry.add(artifact);
        }
        registry
    }
}
