// src/changes/mod.rs

//! Change detection: which artifacts does this run have to deploy?
//!
//! - [`history`]: version-control port and the git implementation.
//! - [`marker`]: per-environment record of the last successful deployment.
//! - [`layout`]: changed path -> artifact identity.
//! - [`rules`]: cross-kind invalidation.
//! - [`detector`]: the [`ChangeDetector`] tying these together.

pub mod detector;
pub mod history;
pub mod layout;
pub mod marker;
pub mod rules;

pub use detector::{ChangeDetector, ChangeSet, DeployAllReason};
pub use history::{GitHistory, History, Revision};
pub use layout::{IdentityExtractor, Layout, LayoutMatch, match_layout};
pub use marker::{FileMarkerStore, MarkerStore, MemoryMarkerStore, RevisionMarker};
pub use rules::{ChangedArtifacts, INVALIDATION_RULES, InvalidationRule, InvalidationScope};
