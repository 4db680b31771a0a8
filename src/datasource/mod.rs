//! The pluggable row-provider port. The engine owns no persistent rows;
//! every scan, lookup and mutation goes through this trait.

pub mod memory;

pub use memory::MemorySource;

use crate::core::{Result, Row, TableInfo, Value};
use crate::result::QueryResult;
use crate::runtime::CancelToken;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Leaf comparison operators accepted by data-source filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    And,
    Or,
}

/// Data-source-level predicate: either a field/op/value leaf or a logical
/// node over sub-filters. Nesting is arbitrary.
///
/// `values` carries one element for plain comparisons, the candidate list
/// for In, `[min, max]` for Between, and nothing for the null checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Condition {
        field: String,
        op: FilterOp,
        values: Vec<Value>,
    },
    Logic {
        op: LogicOp,
        sub_filters: Vec<Filter>,
    },
}

impl Filter {
    pub fn condition(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self::Condition {
            field: field.into(),
            op,
            values: vec![value],
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::condition(field, FilterOp::Eq, value)
    }

    pub fn and(sub_filters: Vec<Filter>) -> Self {
        Self::Logic {
            op: LogicOp::And,
            sub_filters,
        }
    }

    pub fn or(sub_filters: Vec<Filter>) -> Self {
        Self::Logic {
            op: LogicOp::Or,
            sub_filters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Options for `DataSource::query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    pub select_all: bool,
    pub select_columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order_by: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QueryOptions {
    pub fn all() -> Self {
        Self {
            select_all: true,
            ..Default::default()
        }
    }
}

/// Options for mutating calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Upper bound on rows touched by one update/delete; None = no bound.
    pub limit: Option<usize>,
}

/// External row provider. All calls may block on I/O; implementations are
/// expected to observe the token between batches where they can.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn query(&self, token: &CancelToken, table: &str, options: &QueryOptions)
    -> Result<QueryResult>;

    async fn insert(
        &self,
        token: &CancelToken,
        table: &str,
        rows: &[Row],
        options: &WriteOptions,
    ) -> Result<i64>;

    async fn update(
        &self,
        token: &CancelToken,
        table: &str,
        filters: &[Filter],
        updates: &Row,
        options: &WriteOptions,
    ) -> Result<i64>;

    async fn delete(
        &self,
        token: &CancelToken,
        table: &str,
        filters: &[Filter],
        options: &WriteOptions,
    ) -> Result<i64>;

    async fn get_table_info(&self, token: &CancelToken, table: &str) -> Result<TableInfo>;

    /// Index-backed single-filter lookup.
    async fn filter(
        &self,
        token: &CancelToken,
        table: &str,
        filter: &Filter,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<QueryResult>;

    async fn create_table(&self, token: &CancelToken, info: &TableInfo) -> Result<()>;

    async fn drop_table(&self, token: &CancelToken, table: &str) -> Result<()>;

    async fn truncate_table(&self, token: &CancelToken, table: &str) -> Result<()>;

    fn is_writable(&self) -> bool;

    fn is_connected(&self) -> bool;
}
