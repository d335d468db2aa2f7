// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::artifact::{ArtifactId, ArtifactRegistry};

/// Internal node structure: direct dependencies that exist in the registry.
#[derive(Debug, Clone, Default)]
struct DagNode {
    deps: Vec<ArtifactId>,
}

/// In-memory adjacency view of a registry keyed by artifact id.
///
/// Edges to ids absent from the registry are dropped here; the resolver's
/// validation is what reports them.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: BTreeMap<ArtifactId, DagNode>,
}

impl DependencyGraph {
    pub fn from_registry(registry: &ArtifactRegistry) -> Self {
        let mut nodes: BTreeMap<ArtifactId, DagNode> = registry
            .ids()
            .map(|id| (id.to_string(), DagNode::default()))
            .collect();

        for artifact in registry.all() {
            for dep in artifact.dependencies.iter() {
                if !nodes.contains_key(dep) {
                    continue;
                }
                if let Some(node) = nodes.get_mut(&artifact.id) {
                    node.deps.push(dep.clone());
                }
            }
        }

        Self { nodes }
    }

    /// Immediate dependencies of an artifact.
    pub fn dependencies_of(&self, id: &str) -> &[ArtifactId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// `roots` plus everything they transitively require.
    ///
    /// Roots unknown to the graph are ignored. Terminates on cyclic input.
    pub fn dependency_closure<I, S>(&self, roots: I) -> BTreeSet<ArtifactId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stack: Vec<ArtifactId> = roots
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        let mut visited: BTreeSet<ArtifactId> = BTreeSet::new();

        while let Some(id) = stack.pop() {
            if visited.contains(&id) {
                continue;
            }
            for dep in self.dependencies_of(&id) {
                if !visited.contains(dep) {
                    stack.push(dep.clone());
                }
            }
            visited.insert(id);
        }

        visited
    }
}
