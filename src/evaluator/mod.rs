//! Recursive expression evaluation over rows.
//!
//! The evaluator never errors: a malformed expression yields NULL in value
//! position and false in predicate position, matching permissive SQL
//! dialects.

pub mod between;
pub mod comparison;
pub mod in_list;
pub mod is_null;
pub mod like;
pub mod logical;

pub use comparison::{apply_op, compare_values, values_equal};

use crate::core::{Row, Value};
use crate::expr::{Expr, is_comparison_op, normalize_op};

/// Evaluate an expression against a row.
pub fn eval(row: &Row, expr: &Expr) -> Value {
    match expr {
        Expr::Column(name) => lookup_column(row, name),
        Expr::Literal(v) => v.clone(),
        // Function registries are an external concern; an unresolved call
        // evaluates to NULL.
        Expr::Function { .. } => Value::Null,
        Expr::List(_) => Value::Null,
        Expr::Operator { op, left, right } => {
            let left = left.as_deref();
            let right = right.as_deref();
            let op = normalize_op(op);
            match op.as_str() {
                "is null" => is_null::eval(row, left, false),
                "is not null" => is_null::eval(row, left, true),
                "and" => logical::eval_and(row, left, right),
                "or" => logical::eval_or(row, left, right),
                "like" => like::eval(row, left, right, false),
                "not like" => like::eval(row, left, right, true),
                "between" => between::eval(row, left, right, false),
                "not between" => between::eval(row, left, right, true),
                "in" => in_list::eval(row, left, right),
                op if is_comparison_op(op) => comparison::eval(row, op, left, right),
                _ => Value::Null,
            }
        }
    }
}

/// Evaluate an expression as a predicate.
pub fn eval_predicate(row: &Row, expr: &Expr) -> bool {
    eval(row, expr).as_bool()
}

/// Column lookup with qualified-name tolerance: when `t.c` is absent, retry
/// with the suffix after the final dot. A missing column is NULL.
fn lookup_column(row: &Row, name: &str) -> Value {
    if let Some(v) = row.get(name) {
        return v.clone();
    }
    if let Some(idx) = name.rfind('.') {
        if let Some(v) = row.get(&name[idx + 1..]) {
            return v.clone();
        }
    }
    Value::Null
}
