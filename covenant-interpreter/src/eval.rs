//! Tree-walking evaluator for parsed test expressions

use crate::environment::Environment;
use crate::error::{EvalError, EvalResult};
use covenant_core::{Value, ValueError};
use covenant_parser::{BinaryOp, Expr, Literal, UnaryOp};
use std::cmp::Ordering;

/// Evaluates expressions against a borrowed environment
pub struct Evaluator<'e> {
    env: &'e Environment,
}

impl<'e> Evaluator<'e> {
    pub fn new(env: &'e Environment) -> Self {
        Self { env }
    }

    pub fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Identifier(name) => self
                .env
                .lookup(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedSymbol(name.clone())),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                eval_unary(*op, value)
            }
            // Short-circuit forms evaluate the right operand only when needed
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => Ok(Value::Boolean(
                self.eval_condition(left, "&&")? && self.eval_condition(right, "&&")?,
            )),
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => Ok(Value::Boolean(
                self.eval_condition(left, "||")? || self.eval_condition(right, "||")?,
            )),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                eval_binary(*op, left, right)
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(condition, "?:")? {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }
            Expr::Property { object, name } => Ok(self.eval(object)?.property(name)?),
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                Ok(target.index(&index)?)
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                call_method(&receiver, method, &args)
            }
        }
    }

    fn eval_condition(&self, expr: &Expr, operator: &str) -> EvalResult<bool> {
        match self.eval(expr)? {
            Value::Boolean(b) => Ok(b),
            other => Err(EvalError::type_error(format!(
                "operator '{}' expects boolean operands, got {}",
                operator,
                other.type_name()
            ))),
        }
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let symbol = op.symbol();
            let (a, b) = match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => (*a, *b),
                _ => {
                    return Err(EvalError::type_error(format!(
                        "operator '{}' expects boolean operands, got {} and {}",
                        symbol,
                        left.type_name(),
                        right.type_name()
                    )))
                }
            };
            Ok(Value::Boolean(if op == BinaryOp::And { a && b } else { a || b }))
        }
        BinaryOp::Eq => Ok(Value::Boolean(left.loose_eq(&right))),
        BinaryOp::Ne => Ok(Value::Boolean(!left.loose_eq(&right))),
        BinaryOp::Lt => compare(&left, &right, op).map(|o| Value::Boolean(o == Ordering::Less)),
        BinaryOp::Gt => compare(&left, &right, op).map(|o| Value::Boolean(o == Ordering::Greater)),
        BinaryOp::Le => compare(&left, &right, op).map(|o| Value::Boolean(o != Ordering::Greater)),
        BinaryOp::Ge => compare(&left, &right, op).map(|o| Value::Boolean(o != Ordering::Less)),
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, &left, &right)
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Integer(n) => Value::Integer(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match (op, value) {
        (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOp::Neg, Value::Integer(n)) => {
            n.checked_neg().map(Value::Integer).ok_or(EvalError::Overflow("-"))
        }
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, other) => Err(EvalError::type_error(format!(
            "operator '!' expects boolean, got {}",
            other.type_name()
        ))),
        (UnaryOp::Neg, other) => Err(EvalError::type_error(format!(
            "operator '-' expects number, got {}",
            other.type_name()
        ))),
    }
}

fn compare(left: &Value, right: &Value, op: BinaryOp) -> EvalResult<Ordering> {
    let ordering = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) if a.is_number() && b.is_number() => {
            let (x, y) = (a.as_number()?, b.as_number()?);
            x.partial_cmp(&y)
        }
        _ => {
            return Err(EvalError::type_error(format!(
                "cannot compare {} {} {}",
                left.type_name(),
                op.symbol(),
                right.type_name()
            )))
        }
    };
    // NaN compares as unordered; treat it as a failed comparison
    ordering.ok_or_else(|| EvalError::type_error("comparison with NaN"))
}

/// Text used when `+` concatenates: strings appear without quotes
fn concat_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn add(left: Value, right: Value) -> EvalResult<Value> {
    match (&left, &right) {
        (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
            "{}{}",
            concat_text(&left),
            concat_text(&right)
        ))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            Ok(Value::List(items))
        }
        _ => arithmetic(BinaryOp::Add, &left, &right),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                BinaryOp::Div | BinaryOp::Mod if *b == 0 => {
                    return Err(ValueError::DivisionByZero.into())
                }
                BinaryOp::Div => a.checked_div(*b),
                BinaryOp::Mod => a.checked_rem(*b),
                _ => None,
            };
            result
                .map(Value::Integer)
                .ok_or(EvalError::Overflow(op.symbol()))
        }
        (a, b) if a.is_number() && b.is_number() => {
            let (x, y) = (a.as_number()?, b.as_number()?);
            let result = match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x * y,
                BinaryOp::Div => x / y,
                BinaryOp::Mod => x % y,
                _ => f64::NAN,
            };
            Ok(Value::Float(result))
        }
        _ => Err(EvalError::type_error(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn expect_args(method: &str, args: &[Value], expected: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::ArityError {
            method: method.to_string(),
            expected,
            actual: args.len(),
        })
    }
}

fn string_arg<'v>(method: &str, args: &'v [Value]) -> EvalResult<&'v str> {
    expect_args(method, args, 1)?;
    args[0].as_string().map_err(|_| {
        EvalError::type_error(format!(
            "method '{}' expects a string argument, got {}",
            method,
            args[0].type_name()
        ))
    })
}

/// Dispatch a method call on a receiver value
pub fn call_method(receiver: &Value, method: &str, args: &[Value]) -> EvalResult<Value> {
    if method == "equals" {
        expect_args(method, args, 1)?;
        return Ok(Value::Boolean(receiver.loose_eq(&args[0])));
    }

    let unknown = || EvalError::UnknownMethod {
        method: method.to_string(),
        receiver: receiver.type_name(),
    };

    match receiver {
        Value::String(s) => match method {
            "length" | "size" => {
                expect_args(method, args, 0)?;
                Ok(Value::Integer(s.chars().count() as i64))
            }
            "isEmpty" => {
                expect_args(method, args, 0)?;
                Ok(Value::Boolean(s.is_empty()))
            }
            "contains" => Ok(Value::Boolean(s.contains(string_arg(method, args)?))),
            "startsWith" => Ok(Value::Boolean(s.starts_with(string_arg(method, args)?))),
            "endsWith" => Ok(Value::Boolean(s.ends_with(string_arg(method, args)?))),
            "toUpperCase" => {
                expect_args(method, args, 0)?;
                Ok(Value::String(s.to_uppercase()))
            }
            "toLowerCase" => {
                expect_args(method, args, 0)?;
                Ok(Value::String(s.to_lowercase()))
            }
            "trim" => {
                expect_args(method, args, 0)?;
                Ok(Value::String(s.trim().to_string()))
            }
            "get" => {
                expect_args(method, args, 1)?;
                Ok(receiver.index(&args[0])?)
            }
            _ => Err(unknown()),
        },
        Value::List(items) => match method {
            "length" | "size" => {
                expect_args(method, args, 0)?;
                Ok(Value::Integer(items.len() as i64))
            }
            "isEmpty" => {
                expect_args(method, args, 0)?;
                Ok(Value::Boolean(items.is_empty()))
            }
            "contains" => {
                expect_args(method, args, 1)?;
                Ok(Value::Boolean(items.iter().any(|item| item.loose_eq(&args[0]))))
            }
            "get" => {
                expect_args(method, args, 1)?;
                Ok(receiver.index(&args[0])?)
            }
            _ => Err(unknown()),
        },
        Value::Map(map) => match method {
            "length" | "size" => {
                expect_args(method, args, 0)?;
                Ok(Value::Integer(map.len() as i64))
            }
            "isEmpty" => {
                expect_args(method, args, 0)?;
                Ok(Value::Boolean(map.is_empty()))
            }
            "contains" | "containsKey" => {
                Ok(Value::Boolean(map.contains_key(string_arg(method, args)?)))
            }
            "get" => {
                let key = string_arg(method, args)?;
                Ok(map.get(key).cloned().unwrap_or(Value::Null))
            }
            _ => Err(unknown()),
        },
        Value::Object(obj) => match method {
            "get" => {
                let field = string_arg(method, args)?;
                Ok(receiver.property(field)?)
            }
            "has" => Ok(Value::Boolean(obj.has_field(string_arg(method, args)?))),
            _ => Err(unknown()),
        },
        Value::Integer(n) => match method {
            "abs" => {
                expect_args(method, args, 0)?;
                n.checked_abs().map(Value::Integer).ok_or(EvalError::Overflow("abs"))
            }
            _ => Err(unknown()),
        },
        Value::Float(x) => match method {
            "abs" => {
                expect_args(method, args, 0)?;
                Ok(Value::Float(x.abs()))
            }
            _ => Err(unknown()),
        },
        Value::Null => Err(ValueError::InvalidOperation(format!(
            "cannot call method '{}' on null",
            method
        ))
        .into()),
        Value::Boolean(_) => Err(unknown()),
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
