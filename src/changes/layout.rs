// src/changes/layout.rs

//! Mapping of changed file paths to artifact identities.
//!
//! Matching is lexical. Display names are looked up afterwards, from the
//! descriptor next to the artifact, through the [`FileSystem`] port.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::artifact::ArtifactKind;
use crate::artifact::descriptor::{DefinitionFile, PLATFORM_FILE, PlatformFile, read_json};
use crate::fs::FileSystem;

/// Which on-disk layout a path matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `Views/{container}/{item}.sql`
    NestedView,
    /// `{Kind}/{Name}.{Kind}/...`
    GitFolder,
    /// `{Kind}/{Name}.json`
    DefinitionFile,
    /// `Notebooks/{Name}.ipynb`
    NotebookFile,
    /// `{Kind}/{Name}/...`
    MetadataFolder,
}

/// Result of matching one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMatch {
    pub kind: ArtifactKind,
    /// Name derived from the path alone.
    pub name: String,
    pub layout: Layout,
    /// Descriptor that may carry a display name, relative to the deployment root.
    pub descriptor: Option<PathBuf>,
}

/// Match `path` (relative to the deployment root, `/`-separated) against the
/// known layouts under `artifacts_root`.
pub fn match_layout(artifacts_root: &str, path: &str) -> Option<LayoutMatch> {
    let root_parts: Vec<&str> = split(artifacts_root);
    let parts: Vec<&str> = split(path);
    if parts.len() <= root_parts.len() + 1 || parts[..root_parts.len()] != root_parts[..] {
        return None;
    }

    let folder = parts[root_parts.len()];
    let rest = &parts[root_parts.len() + 1..];
    let kind = ArtifactKind::from_folder(folder)?;
    let first = rest[0];

    let descriptor_in = |dir: &str| -> PathBuf {
        let mut p: PathBuf = root_parts.iter().collect();
        p.push(folder);
        p.push(dir);
        p.push(PLATFORM_FILE);
        p
    };

    if kind == ArtifactKind::SqlView {
        // Only `Views/{container}/{item}.sql` names a view.
        if rest.len() != 2 {
            return None;
        }
        let name = rest[1].strip_suffix(".sql").filter(|n| !n.is_empty())?;
        return Some(LayoutMatch {
            kind,
            name: name.to_string(),
            layout: Layout::NestedView,
            descriptor: None,
        });
    }

    let git_suffix = format!(".{}", kind.platform_name());
    if let Some(name) = first.strip_suffix(git_suffix.as_str()).filter(|n| !n.is_empty()) {
        return Some(LayoutMatch {
            kind,
            name: name.to_string(),
            layout: Layout::GitFolder,
            descriptor: Some(descriptor_in(first)),
        });
    }

    if rest.len() == 1 {
        if let Some(name) = first.strip_suffix(".json").filter(|n| !n.is_empty()) {
            let descriptor: PathBuf = parts.iter().collect();
            return Some(LayoutMatch {
                kind,
                name: name.to_string(),
                layout: Layout::DefinitionFile,
                descriptor: Some(descriptor),
            });
        }
        let notebook = first.strip_suffix(".ipynb").filter(|n| !n.is_empty());
        if let (ArtifactKind::Notebook, Some(name)) = (kind, notebook) {
            return Some(LayoutMatch {
                kind,
                name: name.to_string(),
                layout: Layout::NotebookFile,
                descriptor: None,
            });
        }
        return None;
    }

    if first.starts_with('.') {
        return None;
    }
    Some(LayoutMatch {
        kind,
        name: first.to_string(),
        layout: Layout::MetadataFolder,
        descriptor: Some(descriptor_in(first)),
    })
}

fn split(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Turns changed paths into `(kind, display name)` pairs.
#[derive(Debug, Clone)]
pub struct IdentityExtractor {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    artifacts_root: String,
}

impl IdentityExtractor {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        root: impl Into<PathBuf>,
        artifacts_root: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            root: root.into(),
            artifacts_root: artifacts_root.into(),
        }
    }

    pub fn artifacts_root(&self) -> &str {
        &self.artifacts_root
    }

    /// Identity for one path, or `None` if it belongs to no artifact.
    pub fn identify(&self, path: &str) -> Option<(ArtifactKind, String)> {
        let m = match_layout(&self.artifacts_root, path)?;
        let name = self.display_name(&m).unwrap_or_else(|| m.name.clone());
        debug!(path, kind = %m.kind, name = %name, layout = ?m.layout, "path maps to artifact");
        Some((m.kind, name))
    }

    /// Display name from the descriptor. A missing or malformed descriptor
    /// (e.g. the artifact was deleted) falls back to the lexical name.
    fn display_name(&self, m: &LayoutMatch) -> Option<String> {
        let descriptor = self.root.join(m.descriptor.as_ref()?);
        if !self.fs.is_file(&descriptor) {
            return None;
        }
        let fs = self.fs.as_ref();
        let name = match m.layout {
            Layout::GitFolder | Layout::MetadataFolder => read_json::<PlatformFile>(fs, &descriptor)
                .ok()?
                .display_name()
                .map(str::to_string),
            Layout::DefinitionFile => read_json::<DefinitionFile>(fs, &descriptor)
                .ok()?
                .display_name()
                .map(str::to_string),
            Layout::NestedView | Layout::NotebookFile => None,
        };
        if name.is_none() {
            debug!(descriptor = ?descriptor, "descriptor has no display name");
        }
        name
    }
}
