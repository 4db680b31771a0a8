use crate::core::{Row, Value};
use crate::expr::Expr;

/// IS NULL / IS NOT NULL against the evaluated left operand.
pub fn eval(row: &Row, left: Option<&Expr>, negated: bool) -> Value {
    let Some(left) = left else {
        return Value::Boolean(false);
    };
    let value = super::eval(row, left);
    Value::Boolean(value.is_null() != negated)
}
