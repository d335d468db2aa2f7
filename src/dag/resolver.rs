// src/dag/resolver.rs

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, error, info, warn};

use crate::artifact::{Artifact, ArtifactId, ArtifactKind, ArtifactRegistry};
use crate::errors::{DeployError, Result};
use crate::types::CyclePolicy;

/// A declared dependency that points at an id absent from the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyError {
    pub artifact_id: ArtifactId,
    pub artifact_name: String,
    pub missing_id: ArtifactId,
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Artifact '{}' depends on non-existent artifact ID: {}",
            self.artifact_name, self.missing_id
        )
    }
}

/// Orders artifacts for deployment.
///
/// Stateless between calls apart from the nodes it was built from; the
/// declared dependency sets are never mutated.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    artifacts: BTreeMap<ArtifactId, Artifact>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registry(registry: &ArtifactRegistry) -> Self {
        let mut resolver = Self::new();
        for artifact in registry.all() {
            resolver.insert(artifact.clone());
        }
        resolver
    }

    /// Register one node and its edge set.
    pub fn add_artifact<I, S>(
        &mut self,
        id: impl Into<ArtifactId>,
        kind: ArtifactKind,
        name: impl Into<String>,
        dependencies: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<ArtifactId>,
    {
        self.insert(Artifact::new(id, kind, name).depends_on(dependencies));
    }

    fn insert(&mut self, artifact: Artifact) {
        debug!(id = %artifact.id, kind = %artifact.kind, "resolver: added artifact");
        self.artifacts.insert(artifact.id.clone(), artifact);
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Report every declared dependency whose id is not registered.
    ///
    /// Never fails; the caller decides whether to abort.
    pub fn validate_dependencies(&self) -> Vec<DependencyError> {
        let errors: Vec<DependencyError> = self
            .artifacts
            .values()
            .flat_map(|artifact| {
                artifact
                    .dependencies
                    .iter()
                    .filter(|dep| !self.artifacts.contains_key(*dep))
                    .map(|dep| DependencyError {
                        artifact_id: artifact.id.clone(),
                        artifact_name: artifact.name.clone(),
                        missing_id: dep.clone(),
                    })
            })
            .collect();

        if errors.is_empty() {
            debug!(artifacts = self.artifacts.len(), "all dependencies are valid");
        } else {
            for err in &errors {
                warn!(artifact = %err.artifact_id, missing = %err.missing_id, "{err}");
            }
        }

        errors
    }

    /// Kahn's topological sort with a priority-class tie-break.
    ///
    /// Among ready artifacts the lowest `(priority, id)` goes first, so the
    /// output is reproducible. Edges to unregistered ids are ignored.
    pub fn resolve_order(&self) -> Result<Vec<Artifact>> {
        let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (id, artifact) in self.artifacts.iter() {
            let known_deps = artifact
                .dependencies
                .iter()
                .filter(|dep| self.artifacts.contains_key(*dep));
            let mut count = 0;
            for dep in known_deps {
                count += 1;
                dependents.entry(dep.as_str()).or_default().push(id.as_str());
            }
            remaining.insert(id.as_str(), count);
        }

        let mut frontier: BinaryHeap<Reverse<(u8, &str)>> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| Reverse((self.artifacts[*id].kind.priority(), *id)))
            .collect();

        let mut order: Vec<Artifact> = Vec::with_capacity(self.artifacts.len());

        while let Some(Reverse((_, id))) = frontier.pop() {
            order.push(self.artifacts[id].clone());

            for dependent in dependents.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        let priority = self.artifacts[*dependent].kind.priority();
                        frontier.push(Reverse((priority, *dependent)));
                    }
                }
            }
        }

        if order.len() < self.artifacts.len() {
            let placed: BTreeSet<&str> = order.iter().map(|a| a.id.as_str()).collect();
            let unresolved: Vec<&str> = self
                .artifacts
                .keys()
                .map(|s| s.as_str())
                .filter(|id| !placed.contains(id))
                .collect();
            let cycles = self.cycle_components(&unresolved);

            error!(
                remaining = ?unresolved,
                cycles = ?cycles,
                "dependency resolution failed: circular dependency"
            );

            return Err(DeployError::DependencyCycle {
                remaining: unresolved.into_iter().map(str::to_string).collect(),
                cycles,
            });
        }

        Ok(order)
    }

    /// Degraded ordering by priority class only; no dependency guarantee.
    pub fn priority_order(&self) -> Vec<Artifact> {
        let mut order: Vec<Artifact> = self.artifacts.values().cloned().collect();
        order.sort_by(|a, b| {
            (a.kind.priority(), a.id.as_str()).cmp(&(b.kind.priority(), b.id.as_str()))
        });
        order
    }

    /// Resolve the order, applying `policy` when a cycle is found.
    pub fn resolve_with_policy(&self, policy: CyclePolicy) -> Result<Vec<Artifact>> {
        let order = match self.resolve_order() {
            Ok(order) => order,
            Err(err @ DeployError::DependencyCycle { .. }) => match policy {
                CyclePolicy::Abort => return Err(err),
                CyclePolicy::PriorityFallback => {
                    error!(
                        error = %err,
                        "falling back to priority-class order; dependency order is NOT guaranteed for this run"
                    );
                    self.priority_order()
                }
            },
            Err(other) => return Err(other),
        };

        info!("deployment order determined:");
        for (idx, artifact) in order.iter().enumerate() {
            info!("  {}. {} ({})", idx + 1, artifact.name, artifact.kind);
        }

        Ok(order)
    }

    /// Strongly connected components among `unresolved` that form a cycle,
    /// including single nodes that depend on themselves.
    fn cycle_components(&self, unresolved: &[&str]) -> Vec<Vec<String>> {
        let members: BTreeSet<&str> = unresolved.iter().copied().collect();
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for id in unresolved {
            graph.add_node(*id);
        }
        for id in unresolved {
            for dep in self.artifacts[*id].dependencies.iter() {
                if members.contains(dep.as_str()) {
                    graph.add_edge(dep.as_str(), *id, ());
                }
            }
        }

        let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut ids: Vec<String> = scc.into_iter().map(str::to_string).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }
}
