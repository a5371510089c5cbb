//! # varflow
//!
//! A reactive formula evaluation engine over named variables.
//!
//! Formulas are textual algebraic expressions (`"rate * hours + bonus"`)
//! referencing named variables and numeric functions. The engine compiles
//! them once into directly executable programs and maintains a live
//! dependency graph: when an input changes, every transitively dependent
//! computed variable is invalidated, recomputed in dependency order, and
//! observers are notified of each settled change.
//!
//! ## Example
//!
//! ```rust
//! use varflow::Engine;
//!
//! let mut engine = Engine::new();
//! engine.define_input("width", 3.0).unwrap();
//! engine.define_input("height", 4.0).unwrap();
//! engine.define_formula("diagonal", "sqrt(width ^ 2 + height ^ 2)").unwrap();
//!
//! assert_eq!(engine.value("diagonal").unwrap(), 5.0);
//!
//! engine.set_value("width", 6.0).unwrap();
//! engine.set_value("height", 8.0).unwrap();
//! assert_eq!(engine.value("diagonal").unwrap(), 10.0);
//! ```
//!
//! Arithmetic follows IEEE binary64 conventions: division by zero and
//! out-of-domain function inputs produce infinities or NaN, which flow
//! through dependent formulas; the engine never treats them as errors.

pub mod engine;
pub mod error;
pub mod prelude;

pub use engine::{ChangeCallback, Engine, PropagationStats, SubscriptionId, ValueChange};
pub use error::{Error, Result};

// Re-export core types
pub use varflow_core::{
    CoreError, DependencyGraph, Formula, ValueSource, VarId, Variable, VariableKind,
    VariableRegistry, VariableResolver,
};

// Re-export formula types
pub use varflow_formula::{
    compile, parse, parse_formula, tokenize, BinaryOperator, CompiledFormula, Expr, ExprError,
    FunctionDef, FunctionRegistry, LexicalError, LexicalErrorKind, ParsedFormula, Program, Token,
    TokenKind, UnaryOperator,
};
