use super::Value;
use serde::{Deserialize, Serialize};

/// An ordered mapping of column name to value.
///
/// A row carries every column its producer emitted, which may include names
/// that do not appear in the consumer's schema (hidden bookkeeping fields);
/// consumers tolerate the extras and projection trims them explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace, preserving first-insertion order.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Row {
    fn from(entries: [(&str, Value); N]) -> Self {
        entries
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let row = Row::from([
            ("b", Value::Integer(2)),
            ("a", Value::Integer(1)),
            ("c", Value::Integer(3)),
        ]);
        let names: Vec<&str> = row.columns().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut row = Row::from([("x", Value::Integer(1)), ("y", Value::Integer(2))]);
        row.set("x", Value::Integer(10));
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("x"), Some(&Value::Integer(10)));
        let names: Vec<&str> = row.columns().collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_missing_column() {
        let row = Row::from([("a", Value::Integer(1))]);
        assert!(row.get("b").is_none());
    }
}
