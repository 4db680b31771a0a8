use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime value tag. Every narrower numeric widens to Integer or Float on
/// ingest; the engine never sees an i32 or an f32.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "DOUBLE",
            Self::Text(_) => "TEXT",
            Self::Bytes(_) => "BYTES",
            Self::Timestamp(_) => "TIMESTAMP",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// SQL-flavored truthiness: non-zero numeric, non-empty string, true.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Bytes(b) => !b.is_empty(),
            Self::Timestamp(_) => true,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) => {
                if f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical type-tagged key for hash joins and distinct sets.
    /// Integer(1) and Text("1") MUST key differently, so the tag is part of
    /// the key.
    pub fn tagged_key(&self) -> String {
        match self {
            Self::Null => "nil:".to_string(),
            Self::Boolean(b) => format!("b:{}", if *b { 1 } else { 0 }),
            Self::Integer(i) => format!("i:{}", i),
            Self::Float(f) => format!("f:{}", f),
            Self::Text(s) => format!("s:{}", s),
            Self::Bytes(b) => {
                let mut key = String::with_capacity(2 + b.len() * 2);
                key.push_str("x:");
                for byte in b {
                    key.push_str(&format!("{:02x}", byte));
                }
                key
            }
            Self::Timestamp(ts) => format!("t:{}", ts.to_rfc3339()),
        }
    }

    /// Approximate in-memory width in bytes, used by column statistics.
    pub fn width(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Integer(_) | Self::Float(_) | Self::Timestamp(_) => 8,
            Self::Text(s) => s.len(),
            Self::Bytes(b) => b.len(),
        }
    }
}

/// Intrinsic per-tag equality. Mixed numeric tags compare by widening;
/// NULL equals nothing, itself included; string vs numeric is never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64) == *f
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => {
                if fl.is_nan() {
                    write!(f, "NaN")
                } else if fl.is_infinite() {
                    write!(f, "{}", if *fl > 0.0 { "Infinity" } else { "-Infinity" })
                } else {
                    write!(f, "{}", fl)
                }
            }
            Self::Text(s) => write!(f, "{}", s),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

macro_rules! widen_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::Integer(v as i64)
                }
            }
        )*
    };
}

widen_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        if v <= i64::MAX as u64 {
            Self::Integer(v as i64)
        } else {
            Self::Float(v as f64)
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_equals_nothing() {
        assert_ne!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Integer(0));
        assert_ne!(Value::Text(String::new()), Value::Null);
    }

    #[test]
    fn test_mixed_numeric_equality() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Integer(2), Value::Float(2.5));
    }

    #[test]
    fn test_string_never_equals_number() {
        assert_ne!(Value::Text("1".into()), Value::Integer(1));
    }

    #[test]
    fn test_widening_ingest() {
        assert_eq!(Value::from(7u8), Value::Integer(7));
        assert_eq!(Value::from(-3i16), Value::Integer(-3));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert!(matches!(Value::from(u64::MAX), Value::Float(_)));
    }

    #[test]
    fn test_tagged_key_distinguishes_types() {
        assert_ne!(Value::Integer(1).tagged_key(), Value::Text("1".into()).tagged_key());
        assert_ne!(Value::Integer(1).tagged_key(), Value::Float(1.0).tagged_key());
        assert_eq!(Value::Null.tagged_key(), "nil:");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Integer(5).as_bool());
        assert!(!Value::Integer(0).as_bool());
        assert!(Value::Text("x".into()).as_bool());
        assert!(!Value::Text(String::new()).as_bool());
        assert!(!Value::Null.as_bool());
    }
}
