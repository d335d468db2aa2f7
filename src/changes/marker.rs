// src/changes/marker.rs

//! Persistence of the last successfully deployed revision, per environment.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::history::Revision;

const DEPLOYED_AT_PREFIX: &str = "# Last deployment: ";
const ENVIRONMENT_PREFIX: &str = "# Environment: ";

/// What was last deployed to an environment and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionMarker {
    pub revision: Revision,
    pub environment: String,
    /// `None` when the stored timestamp is missing or unparseable.
    pub deployed_at: Option<DateTime<Utc>>,
}

impl RevisionMarker {
    pub fn now(environment: impl Into<String>, revision: impl Into<Revision>) -> Self {
        Self {
            revision: revision.into(),
            environment: environment.into(),
            deployed_at: Some(Utc::now()),
        }
    }

    /// Text form: the revision on the first line, then comment lines.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n", self.revision);
        if let Some(at) = self.deployed_at {
            out.push_str(&format!("{DEPLOYED_AT_PREFIX}{}\n", at.to_rfc3339()));
        }
        out.push_str(&format!("{ENVIRONMENT_PREFIX}{}\n", self.environment));
        out
    }

    /// Parse the text form. Only the first line is required.
    pub fn parse(environment: &str, text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim);
        let revision = match lines.next() {
            Some(first) if !first.is_empty() && !first.starts_with('#') => first.to_string(),
            _ => bail!("marker for environment '{environment}' has no revision on its first line"),
        };

        let mut marker = Self {
            revision,
            environment: environment.to_string(),
            deployed_at: None,
        };
        for line in lines {
            if let Some(ts) = line.strip_prefix(DEPLOYED_AT_PREFIX) {
                marker.deployed_at = DateTime::parse_from_rfc3339(ts.trim())
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
            }
        }
        Ok(marker)
    }
}

/// Storage for revision markers, one per environment.
///
/// Environments never share a marker.
pub trait MarkerStore: Send {
    /// `Ok(None)` when nothing was ever deployed to `environment`.
    fn load(&self, environment: &str) -> Result<Option<RevisionMarker>>;

    fn save(&mut self, marker: &RevisionMarker) -> Result<()>;
}

/// Markers stored as `{dir}/{environment}_last_commit.txt`.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    dir: PathBuf,
}

impl FileMarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn marker_path(&self, environment: &str) -> PathBuf {
        self.dir.join(format!("{environment}_last_commit.txt"))
    }
}

impl MarkerStore for FileMarkerStore {
    fn load(&self, environment: &str) -> Result<Option<RevisionMarker>> {
        let path = self.marker_path(environment);
        if !path.exists() {
            debug!(environment, path = ?path, "no revision marker");
            return Ok(None);
        }
        let text =
            fs::read_to_string(&path).with_context(|| format!("reading marker {:?}", path))?;
        RevisionMarker::parse(environment, &text)
            .with_context(|| format!("parsing marker {:?}", path))
            .map(Some)
    }

    fn save(&mut self, marker: &RevisionMarker) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating tracking dir {:?}", self.dir))?;
        let path = self.marker_path(&marker.environment);

        // Write next to the target and rename over it so readers never see
        // a half-written marker.
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("creating temp file in {:?}", self.dir))?;
        tmp.write_all(marker.to_text().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .with_context(|| format!("replacing marker {:?}", path))?;

        info!(
            environment = %marker.environment,
            revision = %marker.revision,
            path = ?path,
            "saved deployment marker"
        );
        Ok(())
    }
}

/// In-memory store. Clones share state, so a test can keep a handle while
/// the orchestrator owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarkerStore {
    markers: Arc<Mutex<BTreeMap<String, RevisionMarker>>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(self, environment: &str, revision: &str) -> Self {
        self.lock()
            .insert(environment.to_string(), RevisionMarker::now(environment, revision));
        self
    }

    /// Stored revision for `environment`, if any.
    pub fn revision(&self, environment: &str) -> Option<Revision> {
        self.lock().get(environment).map(|m| m.revision.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, RevisionMarker>> {
        self.markers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn load(&self, environment: &str) -> Result<Option<RevisionMarker>> {
        Ok(self.lock().get(environment).cloned())
    }

    fn save(&mut self, marker: &RevisionMarker) -> Result<()> {
        self.lock()
            .insert(marker.environment.clone(), marker.clone());
        Ok(())
    }
}
