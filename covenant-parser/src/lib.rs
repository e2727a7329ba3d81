//! Parser for contract test expressions
//!
//! The expression language is a small boolean-centric language:
//! literals, symbol references, property access, method calls,
//! indexing, arithmetic, comparison, logical operators (symbolic and
//! word forms) and the conditional operator.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use error::{ErrorKind, ParseError, ParseResult};
pub use lexer::{Lexer, Token};
pub use parser::Parser;

/// Parse a test expression with the default depth limit
pub fn parse(source: &str) -> ParseResult<Expr> {
    Parser::new(source).parse()
}
