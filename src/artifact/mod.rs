// src/artifact/mod.rs

//! Deployable artifacts and the in-memory registry that owns them for the
//! duration of one run.
//!
//! - [`kind`] holds the closed set of artifact kinds plus their static
//!   metadata (priority class, on-disk folder, id prefix).
//! - [`registry`] holds the working set of [`Artifact`] records keyed by id.
//! - [`descriptor`] models the metadata files found next to definitions.

pub mod descriptor;
pub mod kind;
pub mod registry;

use std::collections::BTreeSet;

pub use kind::ArtifactKind;
pub use registry::ArtifactRegistry;

/// Canonical artifact id type used as the graph node key.
pub type ArtifactId = String;

/// One deployable unit.
///
/// Records are created by discovery and never edited afterwards; the working
/// set only shrinks by filtering whole records out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub name: String,
    /// Ids this artifact requires to be deployed first. May reference ids
    /// that are not in the registry; the resolver reports those.
    pub dependencies: BTreeSet<ArtifactId>,
}

impl Artifact {
    pub fn new<I, N>(id: I, kind: ArtifactKind, name: N) -> Self
    where
        I: Into<ArtifactId>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            dependencies: BTreeSet::new(),
        }
    }

    /// Artifact with the deterministic default id `"{prefix}-{name}"`.
    pub fn with_default_id<N: Into<String>>(kind: ArtifactKind, name: N) -> Self {
        let name = name.into();
        Self::new(kind.default_id(&name), kind, name)
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArtifactId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }
}
