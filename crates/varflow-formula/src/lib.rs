//! # varflow-formula
//!
//! Formula tokenizer, parser and compiler for varflow.
//!
//! This crate provides:
//! - Tokenizing (text → tokens with source positions)
//! - Parsing (tokens → AST + referenced variable names)
//! - Compiling (AST → executable [`Program`] with all variable and function
//!   references resolved up front)
//! - The built-in numeric function registry
//!
//! ## Example
//!
//! ```rust
//! use varflow_formula::{compile, parse_formula, functions};
//! use varflow_core::VariableRegistry;
//!
//! let mut registry = VariableRegistry::new();
//! registry.add_input("x", 3.0).unwrap();
//!
//! let parsed = parse_formula("sqrt(x ^ 2 + 16)").unwrap();
//! let compiled = compile(&parsed, &registry, functions::builtins()).unwrap();
//! assert_eq!(compiled.program.eval(&registry), 5.0);
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod functions;
pub mod parser;
pub mod token;

pub use ast::{BinaryOperator, Expr, ParsedFormula, UnaryOperator};
pub use compiler::{compile, CompiledFormula, Program};
pub use error::{ExprError, ExprResult, LexicalError, LexicalErrorKind};
pub use functions::{FunctionDef, FunctionImpl, FunctionRegistry};
pub use parser::{parse, parse_formula};
pub use token::{tokenize, Token, TokenKind};
