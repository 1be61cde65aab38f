//! Expression evaluation against a scope chain.
//!
//! Evaluation never fails: unresolvable paths and type-incompatible
//! operator applications degrade to `Value::Null` (an "evaluation miss")
//! rather than erroring, matching the be-permissive-with-missing-data
//! convention of templating engines.

use std::cmp::Ordering;

use crate::ast::{BinOp, Expr, PathSegment, UnaryOp};
use crate::value::{Context, Value};

/// The lookup chain for one evaluation point: the render's base context
/// plus one single-binding overlay per enclosing `for` loop. Lookups walk
/// innermost-first, so loop bindings shadow outer entries of the same
/// name. Overlays borrow their parent, so extending the chain for a loop
/// iteration costs one stack frame, not a copy of the base map.
pub enum Scope<'a> {
    Base(&'a Context),
    Overlay {
        name: &'a str,
        value: &'a Value,
        parent: &'a Scope<'a>,
    },
}

impl<'a> Scope<'a> {
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        match self {
            Scope::Base(ctx) => ctx.get(name),
            Scope::Overlay {
                name: bound,
                value,
                parent,
            } => {
                if *bound == name {
                    Some(value)
                } else {
                    parent.lookup(name)
                }
            }
        }
    }
}

/// Walk a path against the scope. `None` means the path missed: an absent
/// root name, a field segment on a non-map, or an index segment on a
/// non-list or out of range. The whole path short-circuits on the first
/// miss; there is no partial result.
pub fn resolve_path(segments: &[PathSegment], scope: &Scope) -> Option<Value> {
    let mut segments = segments.iter();
    let root = match segments.next() {
        Some(PathSegment::Field(name)) => scope.lookup(name)?,
        _ => return None,
    };

    let mut current = root;
    for segment in segments {
        current = match (segment, current) {
            (PathSegment::Field(name), Value::Map(entries)) => entries.get(name)?,
            (PathSegment::Index(i), Value::List(items)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(current.clone())
}

pub fn eval(expr: &Expr, scope: &Scope) -> Value {
    match expr {
        Expr::Literal(v) => v.clone(),
        Expr::Path(segments) => resolve_path(segments, scope).unwrap_or(Value::Null),
        Expr::Unary(UnaryOp::Not, inner) => Value::Bool(!eval(inner, scope).is_truthy()),
        Expr::Binary(lhs, op, rhs) => eval_binary(lhs, *op, rhs, scope),
    }
}

fn eval_binary(lhs: &Expr, op: BinOp, rhs: &Expr, scope: &Scope) -> Value {
    // Short-circuit before the right side is touched.
    match op {
        BinOp::And => {
            let l = eval(lhs, scope);
            if !l.is_truthy() {
                return Value::Bool(false);
            }
            return Value::Bool(eval(rhs, scope).is_truthy());
        }
        BinOp::Or => {
            let l = eval(lhs, scope);
            if l.is_truthy() {
                return Value::Bool(true);
            }
            return Value::Bool(eval(rhs, scope).is_truthy());
        }
        _ => {}
    }

    let l = eval(lhs, scope);
    let r = eval(rhs, scope);

    match op {
        BinOp::Eq => Value::Bool(l == r),
        BinOp::Ne => Value::Bool(l != r),

        // `+` concatenates when either side is a string, using the
        // canonical stringification for the other side.
        BinOp::Add => match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{l}{r}"))
            }
            _ => Value::Null,
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
            match (l.as_number(), r.as_number()) {
                (Some(a), Some(b)) => Value::Number(match op {
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    _ => a % b,
                }),
                _ => Value::Null,
            }
        }

        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => match compare(&l, &r) {
            Some(ordering) => Value::Bool(match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::Le => ordering != Ordering::Greater,
                BinOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }),
            // Incomparable operands (or a NaN) are a miss, not an error.
            None => Value::Null,
        },

        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

/// Numbers compare numerically; two strings compare lexicographically;
/// anything else is incomparable.
fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
