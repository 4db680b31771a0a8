use super::comparison::values_equal;
use crate::core::{Row, Value};
use crate::expr::Expr;

/// IN over a literal list. A NULL target matches nothing.
pub fn eval(row: &Row, left: Option<&Expr>, right: Option<&Expr>) -> Value {
    let (Some(left), Some(Expr::List(items))) = (left, right) else {
        return Value::Boolean(false);
    };
    let target = super::eval(row, left);
    if target.is_null() {
        return Value::Boolean(false);
    }
    let found = items
        .iter()
        .any(|item| values_equal(&target, &super::eval(row, item)));
    Value::Boolean(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::eval_predicate;

    #[test]
    fn test_in_hits_and_misses() {
        let row = Row::from([("status", Value::Integer(2))]);
        let expr = Expr::in_list(
            Expr::column("status"),
            vec![Expr::literal(1), Expr::literal(2), Expr::literal(3)],
        );
        assert!(eval_predicate(&row, &expr));

        let row = Row::from([("status", Value::Integer(9))]);
        assert!(!eval_predicate(&row, &expr));
    }

    #[test]
    fn test_in_coerces_numeric_strings() {
        let row = Row::from([("status", Value::Text("2".into()))]);
        let expr = Expr::in_list(Expr::column("status"), vec![Expr::literal(2)]);
        assert!(eval_predicate(&row, &expr));
    }

    #[test]
    fn test_null_target_never_in() {
        let row = Row::from([("status", Value::Null)]);
        let expr = Expr::in_list(Expr::column("status"), vec![Expr::literal(1)]);
        assert!(!eval_predicate(&row, &expr));
    }
}
