// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks timeouts, regexes, glob patterns and the environment list.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Glob pattern for the config file itself, relative to `root`, so that
/// editing it counts as a configuration change.
///
/// `None` when the file lies outside `root` and so never shows up in a diff.
pub fn config_file_pattern(config_path: &Path, root: &Path) -> Option<String> {
    let config_path = fs::canonicalize(config_path).unwrap_or_else(|_| config_path.to_path_buf());
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let rel = config_path.strip_prefix(&root).ok()?;

    let parts: Vec<String> = rel
        .components()
        .map(|c| globset::escape(&c.as_os_str().to_string_lossy()))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Default config location: `Deploydag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Deploydag.toml")
}
