// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::dag::DependencyError;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown environment '{name}' (expected one of {known:?})")]
    UnknownEnvironment { name: String, known: Vec<String> },

    #[error("Circular dependency detected involving artifacts: {remaining:?}")]
    DependencyCycle {
        /// Every artifact id the topological sort could not place.
        remaining: Vec<String>,
        /// The strongly connected components that actually form cycles.
        cycles: Vec<Vec<String>>,
    },

    #[error("Dependency validation failed with {} error(s)", .0.len())]
    DependencyValidation(Vec<DependencyError>),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    GitError(#[from] git2::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DeployError>;
