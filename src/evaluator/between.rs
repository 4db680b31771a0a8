use super::comparison::compare_values;
use crate::core::{Row, Value};
use crate::expr::Expr;
use std::cmp::Ordering;

/// BETWEEN / NOT BETWEEN. The right operand is a two-element list
/// [low, high]; an incomparable bound fails the predicate regardless of
/// negation.
pub fn eval(row: &Row, left: Option<&Expr>, right: Option<&Expr>, negated: bool) -> Value {
    let (Some(left), Some(Expr::List(bounds))) = (left, right) else {
        return Value::Boolean(false);
    };
    let [low, high] = bounds.as_slice() else {
        return Value::Boolean(false);
    };

    let target = super::eval(row, left);
    let low = super::eval(row, low);
    let high = super::eval(row, high);

    let (Some(lo_ord), Some(hi_ord)) = (
        compare_values(&target, &low),
        compare_values(&target, &high),
    ) else {
        return Value::Boolean(false);
    };

    let in_range = lo_ord != Ordering::Less && hi_ord != Ordering::Greater;
    Value::Boolean(in_range != negated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::eval_predicate;

    fn between(value: Value, low: i64, high: i64, negated: bool) -> bool {
        let row = Row::from([("v", value)]);
        let op = if negated { "not between" } else { "between" };
        let expr = Expr::binary(
            Expr::column("v"),
            op,
            Expr::List(vec![Expr::literal(low), Expr::literal(high)]),
        );
        eval_predicate(&row, &expr)
    }

    #[test]
    fn test_bounds_inclusive() {
        assert!(between(Value::Integer(25), 25, 30, false));
        assert!(between(Value::Integer(30), 25, 30, false));
        assert!(!between(Value::Integer(31), 25, 30, false));
    }

    #[test]
    fn test_negated() {
        assert!(between(Value::Integer(31), 25, 30, true));
        assert!(!between(Value::Integer(27), 25, 30, true));
    }

    #[test]
    fn test_null_target_fails_both() {
        assert!(!between(Value::Null, 25, 30, false));
        assert!(!between(Value::Null, 25, 30, true));
    }
}
