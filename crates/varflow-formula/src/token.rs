//! Formula tokenizer
//!
//! Converts formula text into a flat token list. Each token carries its byte
//! offset so parse and compile errors can point back into the source.

use crate::error::{LexicalError, LexicalErrorKind};
use std::fmt;

/// Kinds of lexical token
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// Numeric literal
    Number(f64),
    /// Variable or function name
    Ident(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `^`
    Caret,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::LeftParen => write!(f, "'('"),
            TokenKind::RightParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
        }
    }
}

/// A token with its position in the source text
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// Token kind and payload
    pub kind: TokenKind,
    /// Byte offset of the first character of the token
    pub position: usize,
}

/// Tokenize formula text.
///
/// Whitespace is insignificant. Numbers are decimal with optional fraction
/// and optional exponent; identifiers start with a letter or underscore and
/// continue with alphanumerics or underscores.
///
/// # Example
/// ```rust
/// use varflow_formula::token::{tokenize, TokenKind};
///
/// let tokens = tokenize("x + 1").unwrap();
/// assert_eq!(tokens.len(), 3);
/// assert_eq!(tokens[1].kind, TokenKind::Plus);
/// ```
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexicalError> {
    let mut scanner = Scanner { input: text, pos: 0 };
    let mut tokens = Vec::new();

    loop {
        scanner.skip_whitespace();
        if scanner.is_at_end() {
            return Ok(tokens);
        }
        tokens.push(scanner.scan_token()?);
    }
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> Result<Token, LexicalError> {
        let position = self.pos;
        let c = self.peek_char().unwrap();

        let kind = match c {
            '+' => {
                self.advance();
                TokenKind::Plus
            }
            '-' => {
                self.advance();
                TokenKind::Minus
            }
            '*' => {
                self.advance();
                TokenKind::Star
            }
            '/' => {
                self.advance();
                TokenKind::Slash
            }
            '^' => {
                self.advance();
                TokenKind::Caret
            }
            '(' => {
                self.advance();
                TokenKind::LeftParen
            }
            ')' => {
                self.advance();
                TokenKind::RightParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            c if c.is_ascii_digit() => self.scan_number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
            c => {
                return Err(LexicalError {
                    position,
                    kind: LexicalErrorKind::UnexpectedChar(c),
                })
            }
        };

        Ok(Token { kind, position })
    }

    fn scan_number(&mut self) -> Result<TokenKind, LexicalError> {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Fraction
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent: once the marker is consumed at least one digit must follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            let digits_start = self.pos;
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
            if self.pos == digits_start {
                return Err(LexicalError {
                    position: start,
                    kind: LexicalErrorKind::MalformedNumber,
                });
            }
        }

        let literal = &self.input[start..self.pos];
        let value: f64 = literal.parse().map_err(|_| LexicalError {
            position: start,
            kind: LexicalErrorKind::MalformedNumber,
        })?;
        Ok(TokenKind::Number(value))
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        TokenKind::Ident(self.input[start..self.pos].to_string())
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
