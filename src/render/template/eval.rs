use std::cmp::Ordering;
use std::fmt;

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, Timelike};
use rand::Rng;

use super::parser::{BinaryOp, Builtin, Expr, UnaryOp};
use super::TemplateError;
use crate::render::Facilities;

/// Range used by `random()` without arguments.
const RANDOM_DEFAULT_MAX: i64 = 500;
/// Upper bound for `pad`/`zpad` widths.
const MAX_PAD_WIDTH: i64 = 256;
/// Bound on tree depth. Long operator chains build deep trees without
/// any nesting in the source.
const MAX_EVAL_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

pub(super) fn evaluate(expr: &Expr, facilities: &mut Facilities) -> Result<Value, TemplateError> {
    evaluate_at(expr, facilities, 0)
}

fn evaluate_at(
    expr: &Expr,
    facilities: &mut Facilities,
    depth: usize,
) -> Result<Value, TemplateError> {
    if depth >= MAX_EVAL_DEPTH {
        let position = match expr {
            Expr::Unary { position, .. }
            | Expr::Binary { position, .. }
            | Expr::Call { position, .. } => *position,
            _ => 0,
        };
        return Err(TemplateError::new(position, "expression nested too deeply"));
    }
    let depth = depth + 1;

    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Unary {
            op,
            operand,
            position,
        } => {
            let value = evaluate_at(operand, facilities, depth)?;
            unary(*op, value, *position)
        }
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
            ..
        } => {
            if !evaluate_at(lhs, facilities, depth)?.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(evaluate_at(rhs, facilities, depth)?.truthy()))
        }
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
            ..
        } => {
            if evaluate_at(lhs, facilities, depth)?.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(evaluate_at(rhs, facilities, depth)?.truthy()))
        }
        Expr::Binary {
            op,
            lhs,
            rhs,
            position,
        } => {
            let lhs = evaluate_at(lhs, facilities, depth)?;
            let rhs = evaluate_at(rhs, facilities, depth)?;
            binary(*op, lhs, rhs, *position)
        }
        Expr::Call {
            function,
            args,
            position,
        } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate_at(arg, facilities, depth)?);
            }
            call(*function, values, *position, facilities)
        }
    }
}

fn unary(op: UnaryOp, value: Value, position: usize) -> Result<Value, TemplateError> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| TemplateError::new(position, "integer overflow")),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, other) => Err(TemplateError::new(
            position,
            format!("cannot negate a {}", other.type_name()),
        )),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value, position: usize) -> Result<Value, TemplateError> {
    let mismatch = |lhs: &Value, rhs: &Value| {
        TemplateError::new(
            position,
            format!(
                "cannot apply '{}' to {} and {}",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ),
        )
    };

    match op {
        BinaryOp::Eq => return Ok(Value::Bool(equals(&lhs, &rhs))),
        BinaryOp::Ne => return Ok(Value::Bool(!equals(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| mismatch(&lhs, &rhs))?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    match (&lhs, &rhs) {
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b, position),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b, position),
            _ => Err(mismatch(&lhs, &rhs)),
        },
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64, position: usize) -> Result<Value, TemplateError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
        return Err(TemplateError::new(position, "division by zero"));
    }
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        _ => None,
    };
    result
        .map(Value::Int)
        .ok_or_else(|| TemplateError::new(position, "integer overflow"))
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64, position: usize) -> Result<Value, TemplateError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0.0 {
        return Err(TemplateError::new(position, "division by zero"));
    }
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        _ => {
            return Err(TemplateError::new(
                position,
                format!("'{}' is not arithmetic", op.symbol()),
            ))
        }
    };
    Ok(Value::Float(result))
}

fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    }
}

fn call(
    function: Builtin,
    args: Vec<Value>,
    position: usize,
    facilities: &mut Facilities,
) -> Result<Value, TemplateError> {
    let fail = |detail: String| TemplateError::new(position, detail);
    let name = function.name();

    match function {
        Builtin::Random => {
            let (lo, hi) = match args.as_slice() {
                [] => (0, RANDOM_DEFAULT_MAX),
                [lo, hi] => (int_arg(name, lo, position)?, int_arg(name, hi, position)?),
                _ => return Err(fail(format!("{name}() takes 0 or 2 arguments"))),
            };
            if lo > hi {
                return Err(fail(format!("random({lo}, {hi}): empty range")));
            }
            Ok(Value::Int(facilities.rng().gen_range(lo..=hi)))
        }
        Builtin::Hour => Ok(Value::Int(i64::from(facilities.now().hour()))),
        Builtin::Minute => Ok(Value::Int(i64::from(facilities.now().minute()))),
        Builtin::Second => Ok(Value::Int(i64::from(facilities.now().second()))),
        Builtin::Day => Ok(Value::Int(i64::from(facilities.now().day()))),
        Builtin::Month => Ok(Value::Int(i64::from(facilities.now().month()))),
        Builtin::Year => Ok(Value::Int(i64::from(facilities.now().year()))),
        Builtin::Weekday => Ok(Value::Int(i64::from(
            facilities.now().weekday().number_from_monday(),
        ))),
        Builtin::Unix => Ok(Value::Int(facilities.now().timestamp())),
        Builtin::Now => {
            let format = str_arg(name, first(&args), position)?;
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(fail(format!("now(): invalid time format '{format}'")));
            }
            Ok(Value::Str(facilities.now().format(format).to_string()))
        }
        Builtin::Pad | Builtin::Zpad => {
            let (value, width) = two(&args);
            let width = int_arg(name, width, position)?;
            if !(0..=MAX_PAD_WIDTH).contains(&width) {
                return Err(fail(format!(
                    "{name}(): width must be between 0 and {MAX_PAD_WIDTH}"
                )));
            }
            let width = width as usize;
            let padded = match (function, value) {
                (Builtin::Zpad, Value::Int(n)) => format!("{n:0width$}"),
                (Builtin::Zpad, other) => format!("{:0>width$}", other.to_string()),
                (_, other) => format!("{:>width$}", other.to_string()),
            };
            Ok(Value::Str(padded))
        }
        Builtin::Min | Builtin::Max => {
            let (a, b) = two(&args);
            let ordering = compare(a, b).ok_or_else(|| {
                fail(format!(
                    "{name}(): cannot compare {} and {}",
                    a.type_name(),
                    b.type_name()
                ))
            })?;
            let pick_first = match function {
                Builtin::Min => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(if pick_first { a.clone() } else { b.clone() })
        }
        Builtin::Abs => match first(&args) {
            Value::Int(n) => n
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| fail("integer overflow".to_string())),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => Err(fail(format!("abs(): expected a number, got {}", other.type_name()))),
        },
        Builtin::Len => {
            let text = str_arg(name, first(&args), position)?;
            Ok(Value::Int(text.chars().count() as i64))
        }
        Builtin::Upper => Ok(Value::Str(str_arg(name, first(&args), position)?.to_uppercase())),
        Builtin::Lower => Ok(Value::Str(str_arg(name, first(&args), position)?.to_lowercase())),
        Builtin::Str => Ok(Value::Str(first(&args).to_string())),
        Builtin::Int => match first(&args) {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| fail(format!("int(): '{s}' is not an integer"))),
        },
        Builtin::Round => match first(&args) {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(f) => Ok(Value::Int(f.round() as i64)),
            other => Err(fail(format!("round(): expected a number, got {}", other.type_name()))),
        },
    }
}

// Arity is checked by the parser, so these only guard against misuse.
fn first(args: &[Value]) -> &Value {
    const NOTHING: &Value = &Value::Bool(false);
    args.first().unwrap_or(NOTHING)
}

fn two(args: &[Value]) -> (&Value, &Value) {
    const NOTHING: &Value = &Value::Bool(false);
    (
        args.first().unwrap_or(NOTHING),
        args.get(1).unwrap_or(NOTHING),
    )
}

fn int_arg(name: &str, value: &Value, position: usize) -> Result<i64, TemplateError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(TemplateError::new(
            position,
            format!("{name}(): expected an integer, got {}", other.type_name()),
        )),
    }
}

fn str_arg<'v>(name: &str, value: &'v Value, position: usize) -> Result<&'v str, TemplateError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(TemplateError::new(
            position,
            format!("{name}(): expected a string, got {}", other.type_name()),
        )),
    }
}
