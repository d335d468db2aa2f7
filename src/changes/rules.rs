// src/changes/rules.rs

//! Static cross-kind invalidation rules.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::artifact::{ArtifactId, ArtifactKind, ArtifactRegistry};

/// Changed artifact names grouped by kind.
pub type ChangedArtifacts = BTreeMap<ArtifactKind, BTreeSet<String>>;

/// Which dependents of the invalidated kind a rule reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationScope {
    /// Every discovered artifact of the target kind.
    AllOfKind,
    /// Only target artifacts with a declared edge to a changed source.
    DeclaredDependents,
}

/// "A change to `changed` also invalidates `invalidates`."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationRule {
    pub changed: ArtifactKind,
    pub invalidates: ArtifactKind,
    pub scope: InvalidationScope,
}

pub const INVALIDATION_RULES: &[InvalidationRule] = &[
    // Views read from the lakehouse SQL endpoint; we do not track which
    // tables each view reads, so every view is redeployed.
    InvalidationRule {
        changed: ArtifactKind::Lakehouse,
        invalidates: ArtifactKind::SqlView,
        scope: InvalidationScope::AllOfKind,
    },
    InvalidationRule {
        changed: ArtifactKind::SemanticModel,
        invalidates: ArtifactKind::Report,
        scope: InvalidationScope::DeclaredDependents,
    },
    InvalidationRule {
        changed: ArtifactKind::SemanticModel,
        invalidates: ArtifactKind::PaginatedReport,
        scope: InvalidationScope::DeclaredDependents,
    },
];

/// Entries the rules add on top of `changed`, applied until nothing new
/// appears. Entries already in `changed` are not repeated.
pub fn expand_dependents(
    changed: &ChangedArtifacts,
    discovered: &ArtifactRegistry,
    rules: &[InvalidationRule],
) -> ChangedArtifacts {
    let mut seen = changed.clone();
    let mut added = ChangedArtifacts::new();

    loop {
        let mut grew = false;
        for rule in rules {
            let sources: BTreeSet<&str> = match seen.get(&rule.changed) {
                Some(names) if !names.is_empty() => names.iter().map(String::as_str).collect(),
                _ => continue,
            };

            let source_ids: BTreeSet<&ArtifactId> = discovered
                .by_type(rule.changed)
                .into_iter()
                .filter(|a| sources.contains(a.name.as_str()))
                .map(|a| &a.id)
                .collect();

            let targets: Vec<String> = discovered
                .by_type(rule.invalidates)
                .into_iter()
                .filter(|a| match rule.scope {
                    InvalidationScope::AllOfKind => true,
                    InvalidationScope::DeclaredDependents => {
                        a.dependencies.iter().any(|d| source_ids.contains(d))
                    }
                })
                .map(|a| a.name.clone())
                .collect();

            for name in targets {
                if seen.entry(rule.invalidates).or_default().insert(name.clone()) {
                    debug!(
                        kind = %rule.invalidates,
                        name = %name,
                        because = %rule.changed,
                        "invalidated by dependency change"
                    );
                    added.entry(rule.invalidates).or_default().insert(name);
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    added
}
