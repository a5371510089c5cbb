//! Error types for varflow-core

use thiserror::Error;

/// Result type alias using [`CoreError`]
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in varflow-core
#[derive(Debug, Error)]
pub enum CoreError {
    /// A variable with this name already exists in the registry
    #[error("Variable already exists: {0}")]
    DuplicateVariable(String),

    /// No variable with this name exists in the registry
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// The operation requires an input variable, but the target is computed
    #[error("Variable is not an input: {0}")]
    NotAnInput(String),

    /// The operation requires a computed variable, but the target is an input
    #[error("Variable is not a computed variable: {0}")]
    NotAFormula(String),

    /// The variable cannot be removed while other variables depend on it
    #[error("Variable {0} still has dependents")]
    HasDependents(String),

    /// Registering this dependency set would create a cycle
    #[error("Circular dependency: {variable} would depend on itself via {via}")]
    CircularDependency {
        /// The variable being registered or rebound
        variable: String,
        /// The dependency through which the cycle closes
        via: String,
    },
}
