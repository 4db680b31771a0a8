pub mod pattern;

use crate::core::Value;
use serde::{Deserialize, Serialize};

/// Expression tree as delivered inside finalized plans.
///
/// Operators carry their name as a string; `normalize_op` folds case and
/// spacing so that `=`, `==` and `eq` land on the same evaluation arm.
/// `List` is not a value-producing expression: it only ever appears as the
/// right operand of IN / BETWEEN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Operator {
        op: String,
        left: Option<Box<Expr>>,
        right: Option<Box<Expr>>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn binary(left: Expr, op: impl Into<String>, right: Expr) -> Self {
        Self::Operator {
            op: op.into(),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn unary(op: impl Into<String>, operand: Expr) -> Self {
        Self::Operator {
            op: op.into(),
            left: Some(Box::new(operand)),
            right: None,
        }
    }

    pub fn in_list(target: Expr, values: Vec<Expr>) -> Self {
        Self::binary(target, "in", Expr::List(values))
    }

    pub fn between(target: Expr, low: Expr, high: Expr) -> Self {
        Self::binary(target, "between", Expr::List(vec![low, high]))
    }

    /// The referenced column name, when this expression is a plain column.
    pub fn as_column(&self) -> Option<&str> {
        match self {
            Self::Column(name) => Some(name),
            _ => None,
        }
    }
}

/// Lowercase and collapse interior whitespace, so "IS  NOT NULL" and
/// "is not null" are the same operator.
pub fn normalize_op(op: &str) -> String {
    op.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Comparison operators in any of their recognized spellings.
pub fn is_comparison_op(normalized: &str) -> bool {
    matches!(
        normalized,
        "=" | "==" | "eq" | "!=" | "<>" | "ne" | ">" | "gt" | ">=" | "gte" | "<" | "lt" | "<=" | "lte"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_op() {
        assert_eq!(normalize_op("IS  NOT   NULL"), "is not null");
        assert_eq!(normalize_op("Eq"), "eq");
        assert_eq!(normalize_op(" AND "), "and");
    }

    #[test]
    fn test_comparison_aliases() {
        for op in ["=", "==", "eq", "!=", "<>", "ne", ">", "gte", "lte"] {
            assert!(is_comparison_op(op), "{op} should be a comparison");
        }
        assert!(!is_comparison_op("and"));
        assert!(!is_comparison_op("like"));
    }

    #[test]
    fn test_builders() {
        let e = Expr::between(Expr::column("age"), Expr::literal(18), Expr::literal(65));
        let Expr::Operator { op, right, .. } = e else {
            panic!("expected operator");
        };
        assert_eq!(op, "between");
        assert!(matches!(right.as_deref(), Some(Expr::List(items)) if items.len() == 2));
    }
}
