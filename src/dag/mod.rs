// src/dag/mod.rs

//! Dependency graph and deployment ordering.
//!
//! - [`graph`] holds plain adjacency information (dependencies and
//!   dependents) used for closure walks.
//! - [`resolver`] validates declared edges and produces the priority
//!   tie-broken topological order, detecting cycles.

pub mod graph;
pub mod resolver;

pub use graph::DependencyGraph;
pub use resolver::{DependencyError, DependencyResolver};
