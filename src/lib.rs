//! rowrun: an embeddable SQL execution engine.
//!
//! The engine evaluates finalized SELECT/INSERT/UPDATE/DELETE plans against
//! a pluggable row-oriented data source. Three subsystems carry the weight:
//! the pull-based physical operator pipeline, the sampling-driven
//! statistics layer feeding a cardinality estimator, and the type-tolerant
//! expression evaluator. SQL text parsing, the wire surface and the plan
//! optimizer itself live outside this crate; plans arrive already built.

pub mod core;
pub mod datasource;
pub mod evaluator;
pub mod executor;
pub mod expr;
pub mod facade;
pub mod plan;
pub mod result;
pub mod runtime;
pub mod stats;

pub use crate::core::{ColumnInfo, EngineError, Result, Row, TableInfo, Value};
pub use crate::datasource::{
    DataSource, Filter, FilterOp, LogicOp, MemorySource, QueryOptions, SortOrder, WriteOptions,
};
pub use crate::executor::{
    ExecutionContext, FeedbackChannel, Operator, SelectionFeedback, build_operator,
};
pub use crate::expr::Expr;
pub use crate::facade::Engine;
pub use crate::plan::{
    AggFunc, AggregateConfig, AggregateType, DeleteConfig, HashJoinConfig, InsertConfig,
    JoinCondition, JoinType, LimitConfig, OrderByItem, PlanConfig, PlanNode, PlanType,
    ProjectionConfig, SelectionConfig, SortConfig, TableScanConfig, UnionConfig, UpdateConfig,
};
pub use crate::result::QueryResult;
pub use crate::runtime::{CancelToken, QueryRegistry, QuerySnapshot, QueryStatus};
pub use crate::stats::{
    AutoRefreshCache, Bucket, CacheStats, CardinalityEstimator, ColumnStatistics, Histogram,
    HistogramKind, SamplingCollector, StatisticsCache, TableStatistics,
};
