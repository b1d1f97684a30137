//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds an Expression tree that can be evaluated.
//!
//! GRAMMAR:
//!   expression     --> additive
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> "-" unary | primary
//!   primary        --> NUMBER | cell_ref | "(" expression ")"
//!   cell_ref       --> [A-Z]+[0-9]+

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::lexer::Lexer;
use crate::token::Token;

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_expression()?;

        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Expected {}, found {}",
                expected, self.current_token
            )))
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_additive()
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (* and /).
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses unary expressions (negation).
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::Minus {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    /// Parses primary expressions (literals, cell refs, parenthesized expressions).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal(n))
            }

            Token::Identifier(name) => {
                self.advance();
                Self::parse_cell_ref(&name)
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            Token::EOF => Err(ParseError::new("Unexpected end of expression")),

            Token::Illegal(ch) => Err(ParseError::new(format!("Illegal character: {}", ch))),

            token => Err(ParseError::new(format!("Unexpected token: {}", token))),
        }
    }

    /// Splits an identifier like "AA100" into letters and digits, validates
    /// the shape, and converts to a zero-based `Expression::CellRef`.
    fn parse_cell_ref(identifier: &str) -> ParseResult<Expression> {
        let col_part: String = identifier
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        let row_part = &identifier[col_part.len()..];

        if col_part.is_empty() {
            return Err(ParseError::new(format!(
                "Cell reference missing column: {}",
                identifier
            )));
        }
        if row_part.is_empty() || !row_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::new(format!(
                "Cell reference missing row: {}",
                identifier
            )));
        }

        let row: u32 = row_part
            .parse()
            .map_err(|_| ParseError::new(format!("Row number out of range: {}", identifier)))?;
        if row == 0 {
            return Err(ParseError::new("Row number must be >= 1"));
        }

        Ok(Expression::CellRef {
            col: col_letters_to_index(&col_part),
            row: row - 1,
        })
    }
}

/// Converts a base-26 alphabetic column label ("A", "AA", ...) into a
/// zero-based column index. Saturates to u32::MAX on overflow rather than
/// panicking; the engine rejects anything past its own bound anyway.
fn col_letters_to_index(letters: &str) -> u32 {
    let mut result: u32 = 0;
    for ch in letters.chars() {
        let val = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        result = match result.checked_mul(26).and_then(|r| r.checked_add(val)) {
            Some(r) => r,
            None => return u32::MAX,
        };
    }
    result - 1
}

/// Parses a formula body (without the leading `=`) into an AST.
pub fn parse(input: &str) -> ParseResult<Expression> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Expression {
        parse(input).unwrap_or_else(|e| panic!("expected {} to parse, got {}", input, e))
    }

    #[test]
    fn parses_literal() {
        assert_eq!(parse_ok("42"), Expression::Literal(42.0));
    }

    #[test]
    fn parses_cell_ref() {
        assert_eq!(parse_ok("A1"), Expression::CellRef { col: 0, row: 0 });
        assert_eq!(
            parse_ok("AA100"),
            Expression::CellRef { col: 26, row: 99 }
        );
    }

    #[test]
    fn respects_precedence() {
        // 1 + 2 * 3 should parse as 1 + (2 * 3)
        let expr = parse_ok("1+2*3");
        match expr {
            Expression::BinaryOp { left, op: BinaryOperator::Add, right } => {
                assert_eq!(*left, Expression::Literal(1.0));
                match *right {
                    Expression::BinaryOp { op: BinaryOperator::Multiply, .. } => {}
                    other => panic!("expected multiply, got {:?}", other),
                }
            }
            other => panic!("expected add at top level, got {:?}", other),
        }
    }

    #[test]
    fn parses_parens_and_unary() {
        let expr = parse_ok("-(A1+1)");
        match expr {
            Expression::UnaryOp { op: UnaryOperator::Negate, operand } => match *operand {
                Expression::BinaryOp { op: BinaryOperator::Add, .. } => {}
                other => panic!("expected add inside negation, got {:?}", other),
            },
            other => panic!("expected unary negate, got {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse("").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("1 1").is_err());
    }

    #[test]
    fn rejects_malformed_cell_ref() {
        assert!(parse("1A").is_err());
        assert!(parse("A").is_err());
    }

    #[test]
    fn rejects_row_zero() {
        assert!(parse("A0").is_err());
    }
}
