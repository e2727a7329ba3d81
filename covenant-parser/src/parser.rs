//! Recursive descent parser for contract test expressions

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token};
use std::ops::Range;
use tracing::trace;

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Option<Token<'a>>,
    span: Range<usize>,
    /// Current parsing depth to prevent stack overflow
    depth: usize,
    /// Maximum allowed parsing depth
    max_depth: usize,
}

impl<'a> Parser<'a> {
    /// Default maximum parsing depth
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            current: None,
            span: 0..0,
            depth: 0,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the maximum parsing depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole source as a single expression
    pub fn parse(mut self) -> ParseResult<Expr> {
        if self.source.trim().is_empty() {
            return Err(ParseError::EmptyExpression);
        }
        self.advance()?;
        let expr = self.parse_expression()?;
        if let Some(token) = &self.current {
            return Err(ParseError::UnexpectedToken {
                position: self.span.start,
                expected: "end of expression".to_string(),
                found: token.to_string(),
            });
        }
        trace!(source = self.source, expr = %expr, "parsed expression");
        Ok(expr)
    }

    fn advance(&mut self) -> ParseResult<()> {
        match self.lexer.next_token()? {
            Some((token, span)) => {
                self.current = Some(token);
                self.span = span;
            }
            None => {
                self.current = None;
                self.span = self.source.len()..self.source.len();
            }
        }
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match &self.current {
            Some(token) => ParseError::UnexpectedToken {
                position: self.span.start,
                expected: expected.to_string(),
                found: token.to_string(),
            },
            None => ParseError::UnexpectedEof(expected.to_string()),
        }
    }

    fn consume(&mut self, expected: Token<'a>, description: &str) -> ParseResult<()> {
        if self.current.as_ref() == Some(&expected) {
            self.advance()
        } else {
            Err(self.unexpected(description))
        }
    }

    /// Check and increment depth, returning error if max depth exceeded
    fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::MaxDepthExceeded {
                depth: self.depth,
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Decrement depth when leaving a recursive call
    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Chained operators and postfix accessors build left-nested trees,
    /// so each link counts as one level of depth
    fn extend_chain(&mut self, links: &mut usize) -> ParseResult<()> {
        self.enter()?;
        *links += 1;
        Ok(())
    }

    fn end_chain(&mut self, links: usize) {
        self.depth = self.depth.saturating_sub(links);
    }

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.enter()?;
        let result = self.parse_conditional_expression();
        self.leave();
        result
    }

    fn parse_conditional_expression(&mut self) -> ParseResult<Expr> {
        let condition = self.parse_or_expression()?;

        if matches!(self.current, Some(Token::Question)) {
            self.advance()?;
            let then_branch = self.parse_expression()?;
            self.consume(Token::Colon, "':'")?;
            let else_branch = self.parse_expression()?;
            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    fn parse_or_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and_expression()?;
        let mut links = 0;

        while matches!(self.current, Some(Token::OrOr | Token::WordOr)) {
            self.advance()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_and_expression()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }

        self.end_chain(links);
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality_expression()?;
        let mut links = 0;

        while matches!(self.current, Some(Token::AndAnd | Token::WordAnd)) {
            self.advance()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_equality_expression()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }

        self.end_chain(links);
        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_comparison_expression()?;
        let mut links = 0;

        loop {
            let op = match self.current {
                Some(Token::EqEq | Token::WordEq) => BinaryOp::Eq,
                Some(Token::NotEq | Token::WordNe) => BinaryOp::Ne,
                _ => break,
            };
            self.advance()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_comparison_expression()?;
            left = Expr::binary(op, left, right);
        }

        self.end_chain(links);
        Ok(left)
    }

    fn parse_comparison_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive_expression()?;
        let mut links = 0;

        loop {
            let op = match self.current {
                Some(Token::Less | Token::WordLt) => BinaryOp::Lt,
                Some(Token::Greater | Token::WordGt) => BinaryOp::Gt,
                Some(Token::LessEq | Token::WordLe) => BinaryOp::Le,
                Some(Token::GreaterEq | Token::WordGe) => BinaryOp::Ge,
                _ => break,
            };
            self.advance()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_additive_expression()?;
            left = Expr::binary(op, left, right);
        }

        self.end_chain(links);
        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative_expression()?;
        let mut links = 0;

        loop {
            let op = match self.current {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_multiplicative_expression()?;
            left = Expr::binary(op, left, right);
        }

        self.end_chain(links);
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary_expression()?;
        let mut links = 0;

        loop {
            let op = match self.current {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_unary_expression()?;
            left = Expr::binary(op, left, right);
        }

        self.end_chain(links);
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> ParseResult<Expr> {
        let op = match self.current {
            Some(Token::Bang | Token::WordNot) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.parse_postfix_expression(),
        };
        self.advance()?;

        self.enter()?;
        let operand = self.parse_unary_expression();
        self.leave();

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_postfix_expression(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary_expression()?;
        let mut links = 0;

        loop {
            match self.current {
                Some(Token::Dot) => {
                    self.advance()?;
                    self.extend_chain(&mut links)?;
                    let name = match self.current {
                        Some(Token::Ident(name)) => name.to_string(),
                        _ => return Err(self.unexpected("property or method name")),
                    };
                    self.advance()?;

                    if matches!(self.current, Some(Token::LParen)) {
                        self.advance()?;
                        let args = self.parse_arguments(Token::RParen, "')'")?;
                        expr = Expr::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                        };
                    } else {
                        expr = Expr::Property {
                            object: Box::new(expr),
                            name,
                        };
                    }
                }
                Some(Token::LBracket) => {
                    self.advance()?;
                    self.extend_chain(&mut links)?;
                    let index = self.parse_expression()?;
                    self.consume(Token::RBracket, "']'")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        self.end_chain(links);
        Ok(expr)
    }

    /// Comma separated expressions up to and including `close`
    fn parse_arguments(&mut self, close: Token<'a>, description: &str) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();

        if self.current.as_ref() == Some(&close) {
            self.advance()?;
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if matches!(self.current, Some(Token::Comma)) {
                self.advance()?;
            } else {
                break;
            }
        }

        self.consume(close, description)?;
        Ok(args)
    }

    fn parse_primary_expression(&mut self) -> ParseResult<Expr> {
        let expr = match self.current.take() {
            Some(Token::Integer(n)) => Expr::Literal(Literal::Integer(n)),
            Some(Token::Float(x)) => Expr::Literal(Literal::Float(x)),
            Some(Token::String(s)) => Expr::Literal(Literal::String(s)),
            Some(Token::True) => Expr::Literal(Literal::Boolean(true)),
            Some(Token::False) => Expr::Literal(Literal::Boolean(false)),
            Some(Token::Null) => Expr::Literal(Literal::Null),
            Some(Token::Ident(name)) | Some(Token::Keyword(name)) => Expr::identifier(name),
            Some(Token::LParen) => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.consume(Token::RParen, "')'")?;
                return Ok(inner);
            }
            Some(Token::LBracket) => {
                self.advance()?;
                let items = self.parse_arguments(Token::RBracket, "']'")?;
                return Ok(Expr::List(items));
            }
            other => {
                self.current = other;
                return Err(self.unexpected("expression"));
            }
        };
        self.advance()?;
        Ok(expr)
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
