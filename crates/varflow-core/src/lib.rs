//! # varflow-core
//!
//! Core data structures for the varflow formula engine.
//!
//! This crate provides the fundamental types used throughout varflow:
//! - [`Variable`] and [`VariableKind`] - named variables, input or computed
//! - [`VariableRegistry`] - arena-backed variable storage and name resolution
//! - [`DependencyGraph`] - dependency edges with cycle detection and
//!   topological recomputation order
//! - [`Formula`] and [`ValueSource`] - the seam between this crate and the
//!   formula compiler
//!
//! ## Example
//!
//! ```rust
//! use varflow_core::{VariableRegistry, VariableResolver, ValueSource};
//!
//! let mut registry = VariableRegistry::new();
//! let x = registry.add_input("x", 2.0).unwrap();
//!
//! assert_eq!(registry.resolve("x"), Some(x));
//! assert_eq!(registry.value(x), 2.0);
//! ```

pub mod error;
pub mod graph;
pub mod registry;
pub mod variable;

// Re-exports for convenience
pub use error::{CoreError, Result};
pub use graph::DependencyGraph;
pub use registry::{VariableRegistry, VariableResolver};
pub use variable::{Formula, ValueSource, VarId, Variable, VariableKind};
