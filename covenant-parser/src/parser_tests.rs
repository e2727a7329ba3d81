use super::*;
use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::ErrorKind;
use pretty_assertions::assert_eq;

fn parse(source: &str) -> ParseResult<Expr> {
    Parser::new(source).parse()
}

fn int(n: i64) -> Expr {
    Expr::Literal(Literal::Integer(n))
}

#[test]
fn test_precedence() {
    let expr = parse("1 + 2 * 3 > 4 && x").unwrap();
    assert_eq!(
        expr,
        Expr::binary(
            BinaryOp::And,
            Expr::binary(
                BinaryOp::Gt,
                Expr::binary(
                    BinaryOp::Add,
                    int(1),
                    Expr::binary(BinaryOp::Mul, int(2), int(3))
                ),
                int(4)
            ),
            Expr::identifier("x")
        )
    );
}

#[test]
fn test_word_operators_match_symbolic_ones() {
    assert_eq!(
        parse("a gt 1 and not b or c eq d").unwrap(),
        parse("a > 1 && !b || c == d").unwrap()
    );
}

#[test]
fn test_property_and_method_chain() {
    let expr = parse("$this.name.length() > 0").unwrap();
    assert_eq!(
        expr,
        Expr::binary(
            BinaryOp::Gt,
            Expr::MethodCall {
                receiver: Box::new(Expr::Property {
                    object: Box::new(Expr::identifier("$this")),
                    name: "name".to_string(),
                }),
                method: "length".to_string(),
                args: vec![],
            },
            int(0)
        )
    );
}

#[test]
fn test_method_arguments_and_index() {
    let expr = parse("args[0].startsWith('ab', 1)").unwrap();
    assert_eq!(
        expr,
        Expr::MethodCall {
            receiver: Box::new(Expr::Index {
                target: Box::new(Expr::identifier("args")),
                index: Box::new(int(0)),
            }),
            method: "startsWith".to_string(),
            args: vec![Expr::Literal(Literal::String("ab".to_string())), int(1)],
        }
    );
}

#[test]
fn test_conditional_is_right_associative() {
    let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
    assert_eq!(expr.to_string(), "(a ? 1 : (b ? 2 : 3))");
}

#[test]
fn test_unary_and_grouping() {
    let expr = parse("-(1 - 2)").unwrap();
    assert_eq!(
        expr,
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::binary(BinaryOp::Sub, int(1), int(2))),
        }
    );
}

#[test]
fn test_list_literal() {
    assert_eq!(parse("[]").unwrap(), Expr::List(vec![]));
    assert_eq!(parse("[1, 2]").unwrap(), Expr::List(vec![int(1), int(2)]));
}

#[test]
fn test_free_symbols() {
    let expr = parse("name != null && i > 0 && name.length() > i").unwrap();
    assert_eq!(expr.free_symbols(), vec!["name", "i"]);
}

#[test]
fn test_empty_expression() {
    assert_eq!(parse("   ").unwrap_err(), ParseError::EmptyExpression);
}

#[test]
fn test_trailing_tokens_rejected() {
    let err = parse("a b").unwrap_err();
    assert_eq!(
        err,
        ParseError::UnexpectedToken {
            position: 2,
            expected: "end of expression".to_string(),
            found: "identifier 'b'".to_string(),
        }
    );
}

#[test]
fn test_unexpected_eof() {
    assert_eq!(parse("a &&").unwrap_err().kind(), ErrorKind::UnexpectedEof);
    assert_eq!(parse("(a").unwrap_err().kind(), ErrorKind::UnexpectedEof);
    assert_eq!(parse("a ? b").unwrap_err().kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn test_invalid_token() {
    assert_eq!(parse("a @ b").unwrap_err().kind(), ErrorKind::InvalidToken);
}

#[test]
fn test_depth_limit() {
    let mut input = String::new();
    for _ in 0..200 {
        input.push('(');
    }
    input.push('1');
    for _ in 0..200 {
        input.push(')');
    }

    match parse(&input) {
        Err(ParseError::MaxDepthExceeded { max_depth, .. }) => {
            assert_eq!(max_depth, Parser::DEFAULT_MAX_DEPTH)
        }
        other => panic!("Expected MaxDepthExceeded error, got: {:?}", other),
    }
}

#[test]
fn test_custom_depth_limit() {
    let result = Parser::new("!!!!!!!!!!true").with_max_depth(5).parse();
    assert_eq!(result.unwrap_err().kind(), ErrorKind::MaxDepthExceeded);
    assert!(Parser::new("!!true").with_max_depth(5).parse().is_ok());
}

#[test]
fn test_long_operator_chain_hits_depth_limit() {
    let input = vec!["true"; 10_000].join(" && ");
    assert_eq!(
        parse(&input).unwrap_err().kind(),
        ErrorKind::MaxDepthExceeded
    );

    let sum = vec!["1"; 10_000].join(" + ");
    assert_eq!(parse(&sum).unwrap_err().kind(), ErrorKind::MaxDepthExceeded);
}

#[test]
fn test_long_postfix_chain_hits_depth_limit() {
    let input = format!("a{}", ".b".repeat(10_000));
    assert_eq!(
        parse(&input).unwrap_err().kind(),
        ErrorKind::MaxDepthExceeded
    );

    let indexed = format!("a{}", "[0]".repeat(10_000));
    assert_eq!(
        parse(&indexed).unwrap_err().kind(),
        ErrorKind::MaxDepthExceeded
    );
}

#[test]
fn test_moderate_chains_still_parse() {
    assert!(parse(&vec!["x"; 40].join(" || ")).is_ok());
    assert!(parse(&format!("a{}", ".b".repeat(40))).is_ok());
    // Sibling chains do not accumulate depth
    assert!(parse(&format!("({}) && ({})", vec!["1"; 40].join(" + "), vec!["2"; 40].join(" * "))).is_ok());
}
