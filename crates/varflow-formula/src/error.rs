//! Formula error types

use crate::token::TokenKind;
use thiserror::Error;

/// Result type for formula operations
pub type ExprResult<T> = std::result::Result<T, ExprError>;

/// What went wrong while scanning formula text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexicalErrorKind {
    /// A character with no meaning in the formula grammar
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    /// A numeric literal that starts like a number but cannot be one,
    /// e.g. an exponent marker with no digits after it
    #[error("malformed number literal")]
    MalformedNumber,
}

/// Scanning failure, with the byte offset of the offending input
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Lexical error at offset {position}: {kind}")]
pub struct LexicalError {
    /// Byte offset into the formula text
    pub position: usize,
    /// What was wrong there
    pub kind: LexicalErrorKind,
}

/// Errors raised while parsing or compiling a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// Formula text failed to scan
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    /// A token that cannot start or continue the expression at this point
    #[error("Unexpected {found} at offset {position}")]
    UnexpectedToken {
        /// The token that was found
        found: TokenKind,
        /// Byte offset of the token in the formula text
        position: usize,
    },

    /// Input ended in the middle of an expression
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// A complete expression was parsed but input remains
    #[error("Trailing input after expression, starting with {found} at offset {position}")]
    TrailingInput {
        /// The first extra token
        found: TokenKind,
        /// Byte offset of that token
        position: usize,
    },

    /// An empty slot in a function argument list, e.g. `max(1,)`
    #[error("Empty function argument at offset {position}")]
    EmptyArgument {
        /// Byte offset of the token closing the empty slot
        position: usize,
    },

    /// A referenced variable is not present in the registry (compile time)
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// A called function is not in the function registry (compile time)
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A known function called with the wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        /// Function name as written
        function: String,
        /// Human-readable expected count ("1", "1 to 2", "at least 1")
        expected: String,
        /// Number of arguments supplied
        actual: usize,
    },
}
