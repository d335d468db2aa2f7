// src/artifact/descriptor.rs

//! Serde models of the small metadata files that live next to artifact
//! definitions. Only the fields the scheduler cares about are modelled;
//! everything else in those files is ignored.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::fs::FileSystem;

/// Name of the per-artifact descriptor in git-format and metadata folders.
pub const PLATFORM_FILE: &str = ".platform";

/// `.platform` descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformFile {
    #[serde(default)]
    pub metadata: PlatformMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformMetadata {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Single-file JSON definition (`Lakehouses/Sales.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefinitionFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Notebook (`.ipynb`): dependencies live under `metadata.dependencies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookFile {
    #[serde(default)]
    pub metadata: NotebookMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// `Views/{container}/metadata.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewMetadataFile {
    #[serde(default)]
    pub dependencies: BTreeMap<String, ViewDependencies>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewDependencies {
    #[serde(default)]
    pub tables: Vec<String>,
    /// Other views in the same container, `schema.view` or bare `view`.
    #[serde(default)]
    pub views: Vec<String>,
}

/// Read and deserialize a JSON file through the filesystem abstraction.
pub fn read_json<T: DeserializeOwned>(fs: &dyn FileSystem, path: &Path) -> Result<T> {
    let contents = fs.read_to_string(path)?;
    serde_json::from_str(&contents).with_context(|| format!("parsing JSON in {:?}", path))
}

impl PlatformFile {
    /// Non-blank display name, if the descriptor declares one.
    pub fn display_name(&self) -> Option<&str> {
        self.metadata
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl DefinitionFile {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
