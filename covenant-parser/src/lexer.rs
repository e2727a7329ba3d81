//! Lexer for contract test expressions using logos

use crate::error::{ParseError, ParseResult};
use logos::{Lexer as LogosLexer, Logos};
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token<'a> {
    // Literal keywords
    #[token("true", priority = 10)]
    True,
    #[token("false", priority = 10)]
    False,
    #[token("null", priority = 10)]
    Null,

    // Word operators
    #[token("and", priority = 10)]
    WordAnd,
    #[token("or", priority = 10)]
    WordOr,
    #[token("not", priority = 10)]
    WordNot,
    #[token("eq", priority = 10)]
    WordEq,
    #[token("ne", priority = 10)]
    WordNe,
    #[token("lt", priority = 10)]
    WordLt,
    #[token("gt", priority = 10)]
    WordGt,
    #[token("le", priority = 10)]
    WordLe,
    #[token("ge", priority = 10)]
    WordGe,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,

    // Operators
    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEq,
    #[token(">=")]
    GreaterEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Literals
    #[regex(r"[0-9]+", priority = 5, callback = |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", priority = 5, callback = |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#, priority = 5, callback = |lex| {
        let s = lex.slice();
        process_string_escapes(&s[1..s.len() - 1])
    })]
    #[regex(r"'([^'\\]|\\.)*'", priority = 5, callback = |lex| {
        let s = lex.slice();
        process_string_escapes(&s[1..s.len() - 1])
    })]
    String(String),

    /// `$this`, `$result` and other unsubstituted keywords
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", priority = 4)]
    Keyword(&'a str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", priority = 3)]
    Ident(&'a str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => write!(f, "'true'"),
            Token::False => write!(f, "'false'"),
            Token::Null => write!(f, "'null'"),
            Token::WordAnd => write!(f, "'and'"),
            Token::WordOr => write!(f, "'or'"),
            Token::WordNot => write!(f, "'not'"),
            Token::WordEq => write!(f, "'eq'"),
            Token::WordNe => write!(f, "'ne'"),
            Token::WordLt => write!(f, "'lt'"),
            Token::WordGt => write!(f, "'gt'"),
            Token::WordLe => write!(f, "'le'"),
            Token::WordGe => write!(f, "'ge'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Comma => write!(f, "','"),
            Token::Dot => write!(f, "'.'"),
            Token::Question => write!(f, "'?'"),
            Token::Colon => write!(f, "':'"),
            Token::OrOr => write!(f, "'||'"),
            Token::AndAnd => write!(f, "'&&'"),
            Token::Bang => write!(f, "'!'"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Less => write!(f, "'<'"),
            Token::Greater => write!(f, "'>'"),
            Token::LessEq => write!(f, "'<='"),
            Token::GreaterEq => write!(f, "'>='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::Integer(n) => write!(f, "integer {}", n),
            Token::Float(x) => write!(f, "float {}", x),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Keyword(k) => write!(f, "keyword {}", k),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
        }
    }
}

/// Process escape sequences in strings
pub fn process_string_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Peekable token stream that turns unrecognised input into errors
#[derive(Clone)]
pub struct Lexer<'a> {
    inner: LogosLexer<'a, Token<'a>>,
    peeked: Option<(Token<'a>, Range<usize>)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    pub fn next_token(&mut self) -> ParseResult<Option<(Token<'a>, Range<usize>)>> {
        match self.peeked.take() {
            Some(spanned) => Ok(Some(spanned)),
            None => self.advance(),
        }
    }

    pub fn peek_token(&mut self) -> ParseResult<Option<&Token<'a>>> {
        if self.peeked.is_none() {
            self.peeked = self.advance()?;
        }
        Ok(self.peeked.as_ref().map(|(token, _)| token))
    }

    fn advance(&mut self) -> ParseResult<Option<(Token<'a>, Range<usize>)>> {
        match self.inner.next() {
            None => Ok(None),
            Some(Ok(token)) => Ok(Some((token, self.inner.span()))),
            Some(Err(_)) => Err(ParseError::InvalidToken {
                position: self.inner.span().start,
                text: self.inner.slice().to_string(),
            }),
        }
    }
}

/// Tokenize a whole expression, failing on the first invalid token
pub fn tokenize(source: &str) -> ParseResult<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some((token, _)) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        let tokens = tokenize(r#"42 2.5 "hello" 'it\'s' true false null"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Integer(42),
                Token::Float(2.5),
                Token::String("hello".to_string()),
                Token::String("it's".to_string()),
                Token::True,
                Token::False,
                Token::Null,
            ]
        );
    }

    #[test]
    fn test_word_operators_and_identifiers() {
        let tokens = tokenize("a and b or not c eq d android").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a"),
                Token::WordAnd,
                Token::Ident("b"),
                Token::WordOr,
                Token::WordNot,
                Token::Ident("c"),
                Token::WordEq,
                Token::Ident("d"),
                Token::Ident("android"),
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("<= >= < > == != && || ! ? :").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LessEq,
                Token::GreaterEq,
                Token::Less,
                Token::Greater,
                Token::EqEq,
                Token::NotEq,
                Token::AndAnd,
                Token::OrOr,
                Token::Bang,
                Token::Question,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let tokens = tokenize("$this.name $result").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Keyword("$this"),
                Token::Dot,
                Token::Ident("name"),
                Token::Keyword("$result"),
            ]
        );
    }

    #[test]
    fn test_integer_followed_by_method() {
        let tokens = tokenize("5.abs()").unwrap();
        assert_eq!(tokens[0], Token::Integer(5));
        assert_eq!(tokens[1], Token::Dot);
    }

    #[test]
    fn test_invalid_token_reports_position() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidToken {
                position: 2,
                text: "#".to_string()
            }
        );
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("x y");
        assert_eq!(lexer.peek_token().unwrap(), Some(&Token::Ident("x")));
        let (token, span) = lexer.next_token().unwrap().unwrap();
        assert_eq!(token, Token::Ident("x"));
        assert_eq!(span, 0..1);
        assert_eq!(lexer.next_token().unwrap().map(|(t, _)| t), Some(Token::Ident("y")));
        assert_eq!(lexer.next_token().unwrap(), None);
    }
}
