use crate::core::{ColumnInfo, Row};
use serde::{Deserialize, Serialize};

/// The only public output shape of the engine. `total` is the row count;
/// operators preserve it except where the transformation changes
/// cardinality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
    pub total: i64,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let total = rows.len() as i64;
        Self { columns, rows, total }
    }

    /// A DML acknowledgment carrying only the affected-row count.
    pub fn affected(count: i64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            total: count,
        }
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Vertical union of sub-results: the first non-empty schema wins, rows
    /// are concatenated in order, totals are summed.
    pub fn concat(parts: Vec<QueryResult>) -> QueryResult {
        let mut merged = QueryResult::empty();
        for part in parts {
            if merged.columns.is_empty() {
                merged.columns = part.columns;
            }
            merged.total += part.total;
            merged.rows.extend(part.rows);
        }
        merged
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
