//! Prelude module - common imports for varflow users
//!
//! ```rust
//! use varflow::prelude::*;
//! ```

pub use crate::{
    // Main types
    Engine,
    // Error types
    Error,
    ExprError,
    LexicalError,
    // Propagation types
    PropagationStats,
    Result,
    SubscriptionId,
    ValueChange,
    // Variable types
    VarId,
    Variable,
    VariableKind,
    // Formula types
    FunctionRegistry,
    ParsedFormula,
};
