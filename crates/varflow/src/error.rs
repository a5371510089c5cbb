//! Facade error type

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Any error the engine can surface to a caller
#[derive(Debug, Error)]
pub enum Error {
    /// Registry or dependency-graph failure
    #[error(transparent)]
    Core(#[from] varflow_core::CoreError),

    /// Tokenize, parse or compile failure
    #[error(transparent)]
    Formula(#[from] varflow_formula::ExprError),
}
