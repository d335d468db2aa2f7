// src/config/mod.rs

//! Configuration loading and validation for deploydag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate invariants like parseable timeouts and patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_file_pattern, default_config_path, load_and_validate, load_from_path};
pub use model::{ChangesSection, ConfigFile, ConfigSection, DeploySection, RawConfigFile};
