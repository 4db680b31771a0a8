use crate::core::{Row, Value};
use crate::expr::Expr;
use std::cmp::Ordering;

/// Type-tolerant comparator. `None` means the operands are incomparable
/// (either side NULL, or tags with no coercion path); every comparison
/// predicate over an incomparable pair is false.
///
/// Coercion order: i64 when both sides convert without precision loss
/// (integer tags and decimal-free strings), then f64, then lexicographic
/// for two strings, then per-tag for timestamps and bytes.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }

    if let (Some(x), Some(y)) = (int_lossless(a), int_lossless(b)) {
        return Some(x.cmp(&y));
    }

    if let (Some(x), Some(y)) = (float_coerced(a), float_coerced(b)) {
        return x.partial_cmp(&y).or(Some(Ordering::Equal));
    }

    match (a, b) {
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal)
}

/// Interpret a normalized comparison operator against a comparator result.
pub fn apply_op(op: &str, ordering: Option<Ordering>) -> bool {
    let Some(ord) = ordering else {
        return false;
    };
    match op {
        "=" | "==" | "eq" => ord == Ordering::Equal,
        "!=" | "<>" | "ne" => ord != Ordering::Equal,
        ">" | "gt" => ord == Ordering::Greater,
        ">=" | "gte" => ord != Ordering::Less,
        "<" | "lt" => ord == Ordering::Less,
        "<=" | "lte" => ord != Ordering::Greater,
        _ => false,
    }
}

pub fn eval(row: &Row, op: &str, left: Option<&Expr>, right: Option<&Expr>) -> Value {
    let (Some(left), Some(right)) = (left, right) else {
        return Value::Boolean(false);
    };
    let a = super::eval(row, left);
    let b = super::eval(row, right);
    Value::Boolean(apply_op(op, compare_values(&a, &b)))
}

fn int_lossless(v: &Value) -> Option<i64> {
    match v {
        Value::Integer(i) => Some(*i),
        Value::Text(s) => {
            let t = s.trim();
            if t.is_empty() || t.bytes().any(|b| b == b'.' || b == b'e' || b == b'E') {
                None
            } else {
                t.parse::<i64>().ok()
            }
        }
        _ => None,
    }
}

fn float_coerced(v: &Value) -> Option<f64> {
    match v {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_incomparable() {
        assert_eq!(compare_values(&Value::Null, &Value::Null), None);
        assert_eq!(compare_values(&Value::Null, &Value::Integer(1)), None);
        assert!(!apply_op("=", compare_values(&Value::Null, &Value::Null)));
        assert!(!apply_op("!=", compare_values(&Value::Null, &Value::Integer(1))));
    }

    #[test]
    fn test_numeric_string_coercion() {
        assert_eq!(
            compare_values(&Value::Text("42".into()), &Value::Integer(42)),
            Some(Ordering::Equal)
        );
        // i64 path, not lexicographic
        assert_eq!(
            compare_values(&Value::Text("10".into()), &Value::Text("9".into())),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::Text("2.5".into()), &Value::Integer(2)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_lexicographic_fallback() {
        assert_eq!(
            compare_values(&Value::Text("apple".into()), &Value::Text("banana".into())),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_incoercible_mix() {
        assert_eq!(compare_values(&Value::Text("abc".into()), &Value::Integer(1)), None);
    }

    #[test]
    fn test_operator_aliases() {
        let ord = Some(Ordering::Greater);
        assert!(apply_op(">", ord));
        assert!(apply_op("gt", ord));
        assert!(apply_op(">=", ord));
        assert!(apply_op("gte", ord));
        assert!(apply_op("ne", ord));
        assert!(!apply_op("lte", ord));
    }
}
