use super::{ColumnStatistics, StatisticsCache, TableStatistics};
use crate::core::{Result, Value};
use crate::datasource::{Filter, FilterOp, LogicOp};
use crate::plan::JoinType;
use std::sync::Arc;

/// Row count assumed for a table with no statistics at all.
const DEFAULT_TABLE_ROWS: i64 = 10_000;
const INNER_JOIN_FACTOR: f64 = 0.1;

/// Default selectivities used when neither a histogram nor column
/// statistics cover a predicate.
pub fn default_selectivity(op: FilterOp) -> f64 {
    match op {
        FilterOp::Eq => 0.1,
        FilterOp::Ne => 0.9,
        FilterOp::Gt | FilterOp::Ge | FilterOp::Lt | FilterOp::Le => 0.3,
        FilterOp::In => 0.2,
        FilterOp::Between => 0.3,
        FilterOp::Like => 0.25,
        FilterOp::IsNull | FilterOp::IsNotNull => 0.5,
    }
}

/// Cardinality estimator over the statistics cache. Histograms take
/// precedence over plain column statistics, which take precedence over the
/// defaults; logical filters compose as product (AND) and
/// inclusion-exclusion (OR).
pub struct CardinalityEstimator {
    cache: Arc<StatisticsCache>,
}

impl CardinalityEstimator {
    pub fn new(cache: Arc<StatisticsCache>) -> Self {
        Self { cache }
    }

    /// Install statistics directly, bypassing collection.
    pub fn set_statistics(&self, table: &str, statistics: TableStatistics) -> Result<()> {
        self.cache.set(table, statistics)?;
        Ok(())
    }

    fn statistics(&self, table: &str) -> Option<Arc<TableStatistics>> {
        self.cache.get(table).ok().flatten()
    }

    /// Base cardinality of a full scan: estimated row count, then the
    /// collected row count, then the global default.
    pub fn estimate_table_scan(&self, table: &str) -> i64 {
        match self.statistics(table) {
            Some(stats) if stats.estimated_row_count > 0 => stats.estimated_row_count,
            Some(stats) if stats.row_count > 0 => stats.row_count,
            _ => DEFAULT_TABLE_ROWS,
        }
    }

    /// Estimated rows surviving the filters, never below one.
    pub fn estimate_filter(&self, table: &str, filters: &[Filter]) -> i64 {
        let base = self.estimate_table_scan(table) as f64;
        let selectivity: f64 = filters
            .iter()
            .map(|f| self.filter_selectivity(table, f))
            .product();
        ((base * selectivity) as i64).max(1)
    }

    /// Selectivity of one filter tree in [0, 1].
    pub fn filter_selectivity(&self, table: &str, filter: &Filter) -> f64 {
        match filter {
            Filter::Logic { op, sub_filters } => {
                let subs = sub_filters.iter().map(|f| self.filter_selectivity(table, f));
                match op {
                    LogicOp::And => subs.product(),
                    // Inclusion-exclusion, not a naive sum.
                    LogicOp::Or => 1.0 - subs.map(|s| 1.0 - s).product::<f64>(),
                }
            }
            Filter::Condition { field, op, values } => {
                let stats = self.statistics(table);
                if let Some(histogram) = stats.as_ref().and_then(|s| s.histograms.get(field)) {
                    return histogram.estimate_selectivity(*op, values).clamp(0.0, 1.0);
                }
                if let Some(column) = stats.as_ref().and_then(|s| s.columns.get(field)) {
                    return column_selectivity(column, *op, values).clamp(0.0, 1.0);
                }
                default_selectivity(*op)
            }
        }
    }

    /// Join output cardinality by join type.
    pub fn estimate_join(&self, join_type: JoinType, left_rows: i64, right_rows: i64) -> i64 {
        let l = left_rows as f64;
        let r = right_rows as f64;
        let estimate = match join_type {
            JoinType::Inner => l * r * INNER_JOIN_FACTOR,
            JoinType::Left => l,
            JoinType::Right => r,
            JoinType::Full => l + r,
            _ => l * r,
        };
        (estimate as i64).max(1)
    }

    /// DISTINCT over columns: the smallest NDV among them, or half the
    /// table when no statistics cover any column.
    pub fn estimate_distinct(&self, table: &str, columns: &[String]) -> i64 {
        let fallback = (self.estimate_table_scan(table) / 2).max(1);
        let Some(stats) = self.statistics(table) else {
            return fallback;
        };
        columns
            .iter()
            .filter_map(|c| stats.columns.get(c))
            .map(|c| c.distinct_count.max(1))
            .min()
            .unwrap_or(fallback)
    }
}

fn range_fraction(column: &ColumnStatistics, op: FilterOp, value: &Value) -> Option<f64> {
    let (min, max, v) = (column.min.as_f64()?, column.max.as_f64()?, value.as_f64()?);
    let span = max - min;
    if span <= 0.0 {
        return None;
    }
    let fraction = match op {
        FilterOp::Gt | FilterOp::Ge => (max - v) / span,
        FilterOp::Lt | FilterOp::Le => (v - min) / span,
        _ => return None,
    };
    Some(fraction.clamp(0.0, 1.0))
}

fn column_selectivity(column: &ColumnStatistics, op: FilterOp, values: &[Value]) -> f64 {
    let ndv = column.distinct_count;
    match op {
        FilterOp::Eq if ndv > 0 => 1.0 / ndv as f64,
        FilterOp::Ne if ndv > 0 => (ndv - 1) as f64 / ndv as f64,
        FilterOp::Gt | FilterOp::Ge | FilterOp::Lt | FilterOp::Le => values
            .first()
            .and_then(|v| range_fraction(column, op, v))
            .unwrap_or_else(|| default_selectivity(op)),
        FilterOp::In if ndv > 0 => (values.len() as f64 / ndv as f64).min(1.0),
        FilterOp::Between => {
            let [low, high] = values else {
                return default_selectivity(op);
            };
            match (
                range_fraction(column, FilterOp::Ge, low),
                range_fraction(column, FilterOp::Le, high),
            ) {
                (Some(ge), Some(le)) => ge * le,
                _ => default_selectivity(op),
            }
        }
        FilterOp::IsNull => column.null_fraction,
        FilterOp::IsNotNull => 1.0 - column.null_fraction,
        other => default_selectivity(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn column(name: &str, ndv: i64, min: i64, max: i64) -> ColumnStatistics {
        ColumnStatistics {
            name: name.to_string(),
            data_type: "INTEGER".to_string(),
            distinct_count: ndv,
            null_count: 0,
            min: Value::Integer(min),
            max: Value::Integer(max),
            null_fraction: 0.0,
            avg_width: 8.0,
        }
    }

    fn estimator_with(table: &str, row_count: i64, columns: Vec<ColumnStatistics>) -> CardinalityEstimator {
        let cache = Arc::new(StatisticsCache::new(Duration::from_secs(300)));
        let mut stats = TableStatistics::new(table);
        stats.row_count = row_count;
        stats.estimated_row_count = row_count;
        for col in columns {
            stats.columns.insert(col.name.clone(), col);
        }
        let estimator = CardinalityEstimator::new(cache);
        estimator.set_statistics(table, stats).unwrap();
        estimator
    }

    #[test]
    fn test_eq_and_ne_differ() {
        let estimator = estimator_with("t", 1000, vec![column("status", 4, 0, 3)]);
        let eq = estimator.filter_selectivity("t", &Filter::eq("status", Value::Integer(1)));
        let ne = estimator.filter_selectivity(
            "t",
            &Filter::condition("status", FilterOp::Ne, Value::Integer(1)),
        );
        assert!((eq - 0.25).abs() < 1e-9);
        assert!((ne - 0.75).abs() < 1e-9);
        assert_ne!(eq, ne);
    }

    #[test]
    fn test_or_uses_inclusion_exclusion() {
        let estimator = estimator_with("t", 1000, vec![column("status", 4, 0, 3)]);
        let filter = Filter::or(vec![
            Filter::eq("status", Value::Integer(1)),
            Filter::eq("status", Value::Integer(2)),
        ]);
        let sel = estimator.filter_selectivity("t", &filter);
        assert!((sel - 0.4375).abs() < 1e-9);
        assert!(sel < 0.5);
    }

    #[test]
    fn test_and_is_product() {
        let estimator = estimator_with("t", 1000, vec![column("status", 4, 0, 3)]);
        let filter = Filter::and(vec![
            Filter::eq("status", Value::Integer(1)),
            Filter::eq("status", Value::Integer(2)),
        ]);
        let sel = estimator.filter_selectivity("t", &filter);
        assert!((sel - 0.0625).abs() < 1e-9);
    }

    #[test]
    fn test_range_extremes() {
        let estimator = estimator_with("t", 1000, vec![column("age", 50, 10, 100)]);
        let below = estimator.filter_selectivity(
            "t",
            &Filter::condition("age", FilterOp::Gt, Value::Integer(5)),
        );
        let above = estimator.filter_selectivity(
            "t",
            &Filter::condition("age", FilterOp::Gt, Value::Integer(200)),
        );
        assert!(below >= 0.9);
        assert!(above <= 0.1);
    }

    #[test]
    fn test_defaults_without_stats() {
        let cache = Arc::new(StatisticsCache::new(Duration::from_secs(300)));
        let estimator = CardinalityEstimator::new(cache);
        assert_eq!(estimator.estimate_table_scan("ghost"), DEFAULT_TABLE_ROWS);

        let eq = estimator.filter_selectivity("ghost", &Filter::eq("x", Value::Integer(1)));
        let ne = estimator.filter_selectivity(
            "ghost",
            &Filter::condition("x", FilterOp::Ne, Value::Integer(1)),
        );
        assert_eq!(eq, 0.1);
        assert_eq!(ne, 0.9);
        assert!(ne > eq);
    }

    #[test]
    fn test_filter_floor_is_one_row() {
        let estimator = estimator_with("t", 10, vec![column("id", 10_000, 0, 9)]);
        let filters = vec![
            Filter::eq("id", Value::Integer(1)),
            Filter::eq("id", Value::Integer(2)),
        ];
        assert_eq!(estimator.estimate_filter("t", &filters), 1);
    }

    #[test]
    fn test_join_estimates() {
        let cache = Arc::new(StatisticsCache::new(Duration::from_secs(300)));
        let estimator = CardinalityEstimator::new(cache);
        assert_eq!(estimator.estimate_join(JoinType::Inner, 100, 100), 1000);
        assert_eq!(estimator.estimate_join(JoinType::Left, 100, 50), 100);
        assert_eq!(estimator.estimate_join(JoinType::Right, 100, 50), 50);
        assert_eq!(estimator.estimate_join(JoinType::Full, 100, 50), 150);
        assert_eq!(estimator.estimate_join(JoinType::Cross, 10, 10), 100);
    }

    #[test]
    fn test_distinct_estimates() {
        let estimator = estimator_with(
            "t",
            1000,
            vec![column("a", 40, 0, 100), column("b", 7, 0, 100)],
        );
        assert_eq!(
            estimator.estimate_distinct("t", &["a".into(), "b".into()]),
            7
        );
        assert_eq!(estimator.estimate_distinct("t", &["unknown".into()]), 500);

        let cache = Arc::new(StatisticsCache::new(Duration::from_secs(300)));
        let bare = CardinalityEstimator::new(cache);
        assert_eq!(bare.estimate_distinct("ghost", &["a".into()]), 5000);
    }

    #[test]
    fn test_in_selectivity_scales_with_list() {
        let estimator = estimator_with("t", 1000, vec![column("status", 10, 0, 9)]);
        let filter = Filter::Condition {
            field: "status".into(),
            op: FilterOp::In,
            values: vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        };
        let sel = estimator.filter_selectivity("t", &filter);
        assert!((sel - 0.3).abs() < 1e-9);
    }
}
