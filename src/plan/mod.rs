//! Finalized physical plans as delivered by an external planner/optimizer.
//! The engine validates shape (config/type match, child arity) but performs
//! no plan rewriting of its own.

use crate::core::{ColumnInfo, Row};
use crate::datasource::{Filter, SortOrder};
use crate::expr::Expr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    TableScan,
    Selection,
    Projection,
    Limit,
    Sort,
    Aggregate,
    HashJoin,
    Union,
    Insert,
    Update,
    Delete,
}

/// Plan tree node. `config` must match `plan_type`; a mismatch is rejected
/// by the operator builder as a config error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNode {
    pub plan_type: PlanType,
    pub config: PlanConfig,
    pub children: Vec<PlanNode>,
    pub output_schema: Vec<ColumnInfo>,
}

impl PlanNode {
    pub fn new(plan_type: PlanType, config: PlanConfig) -> Self {
        Self {
            plan_type,
            config,
            children: Vec::new(),
            output_schema: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<PlanNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_schema(mut self, schema: Vec<ColumnInfo>) -> Self {
        self.output_schema = schema;
        self
    }
}

/// Per-operator configuration, discriminated by `PlanType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlanConfig {
    TableScan(TableScanConfig),
    Selection(SelectionConfig),
    Projection(ProjectionConfig),
    Limit(LimitConfig),
    Sort(SortConfig),
    Aggregate(AggregateConfig),
    HashJoin(HashJoinConfig),
    Union(UnionConfig),
    Insert(InsertConfig),
    Update(UpdateConfig),
    Delete(DeleteConfig),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableScanConfig {
    pub table: String,
    /// Empty = all columns.
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub condition: Expr,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub expressions: Vec<Expr>,
    /// Parallel to `expressions`; an empty string means no alias. May be
    /// shorter than `expressions`.
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Negative = everything after the offset.
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    pub order_by: Vec<OrderByItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderByItem {
    /// Must be a column reference; any other expression is a tie-break
    /// no-op.
    pub expr: Expr,
    pub direction: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateType {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggFunc {
    pub func: AggregateType,
    /// Empty = synthesize `agg_<i>` from the aggregate's index.
    pub alias: String,
    /// None = count-every-row semantics (COUNT(*)).
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub group_by_cols: Vec<String>,
    pub agg_funcs: Vec<AggFunc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Semi,
    Anti,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinCondition {
    pub column: String,
}

impl JoinCondition {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashJoinConfig {
    pub join_type: JoinType,
    /// Pairwise with `right_conds`: left_conds[i].column = right_conds[i].column.
    pub left_conds: Vec<JoinCondition>,
    pub right_conds: Vec<JoinCondition>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnionConfig {
    pub distinct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertConfig {
    pub table: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    pub table: String,
    pub updates: Row,
    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfig {
    pub table: String,
    pub filter: Option<Expr>,
}
