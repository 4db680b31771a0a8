use crate::core::{Row, Value};
use crate::expr::Expr;

/// AND with short-circuit on the truthiness of the left side.
pub fn eval_and(row: &Row, left: Option<&Expr>, right: Option<&Expr>) -> Value {
    let (Some(left), Some(right)) = (left, right) else {
        return Value::Boolean(false);
    };
    if !super::eval(row, left).as_bool() {
        return Value::Boolean(false);
    }
    Value::Boolean(super::eval(row, right).as_bool())
}

/// OR with short-circuit on the truthiness of the left side.
pub fn eval_or(row: &Row, left: Option<&Expr>, right: Option<&Expr>) -> Value {
    let (Some(left), Some(right)) = (left, right) else {
        return Value::Boolean(false);
    };
    if super::eval(row, left).as_bool() {
        return Value::Boolean(true);
    }
    Value::Boolean(super::eval(row, right).as_bool())
}
