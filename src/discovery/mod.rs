// src/discovery/mod.rs

//! Discovery: build the full artifact registry from the artifacts tree.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::artifact::descriptor::{
    DefinitionFile, NotebookFile, PLATFORM_FILE, PlatformFile, ViewMetadataFile, read_json,
};
use crate::artifact::{Artifact, ArtifactKind, ArtifactRegistry};
use crate::errors::Result;
use crate::fs::FileSystem;

/// File holding view-to-view dependencies inside a view container.
pub const VIEW_METADATA_FILE: &str = "metadata.json";

/// Source of the full artifact registry for a run.
pub trait Discovery {
    fn discover(&self) -> Result<ArtifactRegistry>;
}

/// Scans `{artifacts_dir}/{Folder}` for every kind that has a folder.
#[derive(Debug, Clone)]
pub struct FsDiscovery {
    fs: Arc<dyn FileSystem>,
    artifacts_dir: PathBuf,
}

impl FsDiscovery {
    pub fn new(fs: Arc<dyn FileSystem>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    fn discover_kind(&self, kind: ArtifactKind, dir: &Path, registry: &mut ArtifactRegistry) -> Result<()> {
        let entries = self.fs.read_dir(dir)?;

        // Files first so a notebook seen as `.ipynb` wins over its folder twin.
        let mut notebooks: BTreeSet<String> = BTreeSet::new();
        for path in entries.iter().filter(|p| self.fs.is_file(p)) {
            let artifact = match extension(path) {
                Some("json") => self.json_definition(kind, path),
                Some("ipynb") if kind == ArtifactKind::Notebook => self.notebook(path),
                _ => None,
            };
            if let Some(artifact) = artifact {
                if kind == ArtifactKind::Notebook {
                    notebooks.insert(artifact.name.clone());
                }
                register(registry, artifact);
            }
        }

        for path in entries.iter().filter(|p| self.fs.is_dir(p)) {
            let Some(artifact) = self.platform_folder(kind, path) else {
                continue;
            };
            if kind == ArtifactKind::Notebook && notebooks.contains(&artifact.name) {
                debug!(name = %artifact.name, "notebook already discovered from .ipynb; skipping folder");
                continue;
            }
            register(registry, artifact);
        }
        Ok(())
    }

    fn json_definition(&self, kind: ArtifactKind, path: &Path) -> Option<Artifact> {
        let def: DefinitionFile = match read_json(self.fs.as_ref(), path) {
            Ok(def) => def,
            Err(err) => {
                warn!(path = ?path, error = %err, "skipping malformed definition");
                return None;
            }
        };
        let name = def
            .display_name()
            .map(str::to_string)
            .or_else(|| file_stem(path))?;
        let id = def
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| kind.default_id(&name));
        Some(Artifact::new(id, kind, name).depends_on(def.dependencies))
    }

    fn notebook(&self, path: &Path) -> Option<Artifact> {
        let name = file_stem(path)?;
        let nb: NotebookFile = match read_json(self.fs.as_ref(), path) {
            Ok(nb) => nb,
            Err(err) => {
                warn!(path = ?path, error = %err, "skipping malformed notebook");
                return None;
            }
        };
        Some(Artifact::with_default_id(ArtifactKind::Notebook, name).depends_on(nb.metadata.dependencies))
    }

    /// Git-format (`Name.Kind/`) and metadata (`Name/`) folders. Folders
    /// without a `.platform` descriptor are not artifacts.
    fn platform_folder(&self, kind: ArtifactKind, dir: &Path) -> Option<Artifact> {
        let folder_name = dir.file_name()?.to_str()?;
        if folder_name.starts_with('.') {
            return None;
        }
        let descriptor = dir.join(PLATFORM_FILE);
        if !self.fs.is_file(&descriptor) {
            debug!(dir = ?dir, "no {PLATFORM_FILE} descriptor; ignoring folder");
            return None;
        }
        let platform: PlatformFile = match read_json(self.fs.as_ref(), &descriptor) {
            Ok(p) => p,
            Err(err) => {
                warn!(path = ?descriptor, error = %err, "skipping malformed descriptor");
                return None;
            }
        };

        let suffix = format!(".{}", kind.platform_name());
        let lexical = folder_name.strip_suffix(suffix.as_str()).unwrap_or(folder_name);
        let name = platform.display_name().unwrap_or(lexical).to_string();
        Some(Artifact::with_default_id(kind, name).depends_on(platform.metadata.dependencies))
    }

    /// `Views/{container}/*.sql`. Each view depends on the lakehouse of its
    /// container and on the views listed in the container's metadata file.
    fn discover_views(&self, dir: &Path, registry: &mut ArtifactRegistry) -> Result<()> {
        for container_dir in self.fs.read_dir(dir)? {
            if !self.fs.is_dir(&container_dir) {
                continue;
            }
            let Some(container) = container_dir.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            let metadata_path = container_dir.join(VIEW_METADATA_FILE);
            let metadata: ViewMetadataFile = if self.fs.is_file(&metadata_path) {
                read_json(self.fs.as_ref(), &metadata_path).unwrap_or_else(|err| {
                    warn!(path = ?metadata_path, error = %err, "ignoring malformed view metadata");
                    ViewMetadataFile::default()
                })
            } else {
                ViewMetadataFile::default()
            };

            for path in self.fs.read_dir(&container_dir)? {
                if !self.fs.is_file(&path) || extension(&path) != Some("sql") {
                    continue;
                }
                let Some(name) = file_stem(&path) else { continue };

                let mut deps = vec![ArtifactKind::Lakehouse.default_id(container)];
                if let Some(declared) = metadata.dependencies.get(&name) {
                    deps.extend(declared.views.iter().map(|v| {
                        let view = v.rsplit('.').next().unwrap_or(v);
                        view_id(container, view)
                    }));
                }

                register(
                    registry,
                    Artifact::new(view_id(container, &name), ArtifactKind::SqlView, name).depends_on(deps),
                );
            }
        }
        Ok(())
    }
}

impl Discovery for FsDiscovery {
    fn discover(&self) -> Result<ArtifactRegistry> {
        let mut registry = ArtifactRegistry::new();
        if !self.fs.is_dir(&self.artifacts_dir) {
            warn!(dir = ?self.artifacts_dir, "artifacts directory not found; nothing discovered");
            return Ok(registry);
        }

        for kind in ArtifactKind::ALL {
            let Some(folder) = kind.folder() else { continue };
            let dir = self.artifacts_dir.join(folder);
            if !self.fs.is_dir(&dir) {
                continue;
            }
            let before = registry.len();
            if kind == ArtifactKind::SqlView {
                self.discover_views(&dir, &mut registry)?;
            } else {
                self.discover_kind(kind, &dir, &mut registry)?;
            }
            debug!(kind = %kind, found = registry.len() - before, "scanned {folder}");
        }

        info!(artifacts = registry.len(), dir = ?self.artifacts_dir, "discovery complete");
        Ok(registry)
    }
}

/// Id of view `name` in `container`.
pub fn view_id(container: &str, name: &str) -> String {
    format!("{}-{container}-{name}", ArtifactKind::SqlView.id_prefix())
}

fn register(registry: &mut ArtifactRegistry, artifact: Artifact) {
    let id = artifact.id.clone();
    if let Some(previous) = registry.add(artifact) {
        warn!(id = %id, previous = %previous.name, "duplicate artifact id; later definition wins");
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
