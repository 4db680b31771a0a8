//! Cost-based statistics: sampling collectors, histograms, the TTL cache
//! and the cardinality estimator consumed by an external optimizer.

pub mod cache;
pub mod collector;
pub mod estimator;
pub mod histogram;
pub mod refresh;

pub use cache::{CacheStats, StatisticsCache};
pub use collector::SamplingCollector;
pub use estimator::CardinalityEstimator;
pub use histogram::{Bucket, Histogram, HistogramKind};
pub use refresh::AutoRefreshCache;

use crate::core::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-column statistics computed from a sample. Owned by the stats cache
/// after collection; readers treat handed-out snapshots as immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub name: String,
    /// Inferred from the first non-null value tag in the sample.
    pub data_type: String,
    pub distinct_count: i64,
    pub null_count: i64,
    pub min: Value,
    pub max: Value,
    pub null_fraction: f64,
    pub avg_width: f64,
}

/// Statistics snapshot for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatistics {
    pub table: String,
    pub row_count: i64,
    pub sample_count: i64,
    pub sample_ratio: f64,
    pub columns: HashMap<String, ColumnStatistics>,
    pub histograms: HashMap<String, Histogram>,
    pub collect_ts: DateTime<Utc>,
    pub estimated_row_count: i64,
}

impl TableStatistics {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row_count: 0,
            sample_count: 0,
            sample_ratio: 0.0,
            columns: HashMap::new(),
            histograms: HashMap::new(),
            collect_ts: Utc::now(),
            estimated_row_count: 0,
        }
    }
}
