//! Formula parser
//!
//! A recursive descent parser over the token stream with one method per
//! precedence level. Collects every referenced variable name as it goes.

use crate::ast::{BinaryOperator, Expr, ParsedFormula, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::token::{tokenize, Token, TokenKind};
use std::collections::BTreeSet;

/// Tokenize and parse a formula string.
///
/// # Example
/// ```rust
/// use varflow_formula::parse_formula;
///
/// let parsed = parse_formula("rate * hours + bonus").unwrap();
/// let names: Vec<_> = parsed.variables.iter().cloned().collect();
/// assert_eq!(names, ["bonus", "hours", "rate"]);
/// ```
pub fn parse_formula(text: &str) -> ExprResult<ParsedFormula> {
    let tokens = tokenize(text)?;
    parse(&tokens)
}

/// Parse a token sequence into an expression tree.
///
/// Precedence (loosest to tightest): addition/subtraction, multiplication/
/// division, unary minus, power. Power is right-associative, the rest
/// left-associative. Unary minus binds LOOSER than power, so `-2 ^ 2` is
/// `-(2 ^ 2)`; the exponent position re-enters the unary level so `2 ^ -3`
/// still parses.
pub fn parse(tokens: &[Token]) -> ExprResult<ParsedFormula> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        variables: BTreeSet::new(),
    };

    let expr = parser.parse_expression()?;

    if let Some(token) = parser.peek() {
        return Err(ExprError::TrailingInput {
            found: token.kind.clone(),
            position: token.position,
        });
    }

    Ok(ParsedFormula {
        expr,
        variables: parser.variables,
    })
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    variables: BTreeSet<String>,
}

impl<'a> Parser<'a> {
    // === Expression parsing with precedence ===

    fn parse_expression(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOperator::Add,
                Some(TokenKind::Minus) => BinaryOperator::Subtract,
                _ => break,
            };

            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOperator::Multiply,
                Some(TokenKind::Slash) => BinaryOperator::Divide,
                _ => break,
            };

            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        if matches!(self.peek_kind(), Some(TokenKind::Minus)) {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_power()
    }

    fn parse_power(&mut self) -> ExprResult<Expr> {
        let left = self.parse_atom()?;

        if matches!(self.peek_kind(), Some(TokenKind::Caret)) {
            self.pos += 1;
            // Right associative; re-enters unary so `2 ^ -3` parses
            let right = self.parse_unary()?;
            return Ok(Expr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_atom(&mut self) -> ExprResult<Expr> {
        let token = self.consume()?;

        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(*n)),

            TokenKind::Ident(name) => {
                if matches!(self.peek_kind(), Some(TokenKind::LeftParen)) {
                    self.parse_function_call(name.clone())
                } else {
                    self.variables.insert(name.clone());
                    Ok(Expr::Variable(name.clone()))
                }
            }

            TokenKind::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(expr)
            }

            _ => Err(ExprError::UnexpectedToken {
                found: token.kind.clone(),
                position: token.position,
            }),
        }
    }

    fn parse_function_call(&mut self, name: String) -> ExprResult<Expr> {
        self.expect(TokenKind::LeftParen)?;

        let mut args = Vec::new();

        match self.peek() {
            Some(token) if token.kind == TokenKind::RightParen => {}
            Some(token) if token.kind == TokenKind::Comma => {
                return Err(ExprError::EmptyArgument {
                    position: token.position,
                });
            }
            _ => {
                args.push(self.parse_expression()?);

                while matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.pos += 1;
                    // `f(1,)` and `f(1,,2)` both leave an empty slot
                    if let Some(token) = self.peek() {
                        if matches!(token.kind, TokenKind::RightParen | TokenKind::Comma) {
                            return Err(ExprError::EmptyArgument {
                                position: token.position,
                            });
                        }
                    }
                    args.push(self.parse_expression()?);
                }
            }
        }

        self.expect(TokenKind::RightParen)?;
        Ok(Expr::Function { name, args })
    }

    // === Helper methods ===

    // Returned references borrow the token slice, not the parser, so the
    // caller can keep a token while continuing to parse.
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn consume(&mut self) -> ExprResult<&'a Token> {
        let token = self.tokens.get(self.pos).ok_or(ExprError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: TokenKind) -> ExprResult<()> {
        match self.peek() {
            Some(token) if token.kind == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(ExprError::UnexpectedToken {
                found: token.kind.clone(),
                position: token.position,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
