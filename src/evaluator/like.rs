use crate::core::{Row, Value};
use crate::expr::{Expr, pattern};

/// LIKE / NOT LIKE. Both sides are coerced to their string rendering;
/// a NULL on either side fails the predicate regardless of negation.
pub fn eval(row: &Row, left: Option<&Expr>, right: Option<&Expr>, negated: bool) -> Value {
    let (Some(left), Some(right)) = (left, right) else {
        return Value::Boolean(false);
    };
    let text = super::eval(row, left);
    let pat = super::eval(row, right);
    if text.is_null() || pat.is_null() {
        return Value::Boolean(false);
    }
    let matched = pattern::eval_like(&text.to_string(), &pat.to_string());
    Value::Boolean(matched != negated)
}
