use super::{ColumnStatistics, TableStatistics};
use crate::core::{Result, Row, Value};
use crate::datasource::{DataSource, QueryOptions};
use crate::runtime::CancelToken;
use crate::stats::Histogram;
use chrono::Utc;
use futures::future::join_all;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// Row count assumed when the data source cannot report one.
const DEFAULT_ROW_COUNT: i64 = 100_000;
/// Sample-size floor for tables larger than the sample-everything cutoff.
const MIN_SAMPLE_ROWS: i64 = 100;
const DEFAULT_MAX_SAMPLE_ROWS: i64 = 10_000;
const HISTOGRAM_BUCKETS: usize = 10;

/// Collects table statistics by systematic stride sampling: pull the scan,
/// take every stride-th row, then compute per-column statistics and
/// histograms in parallel.
pub struct SamplingCollector {
    source: Arc<dyn DataSource>,
    max_rows: i64,
    bucket_count: usize,
}

impl SamplingCollector {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            max_rows: DEFAULT_MAX_SAMPLE_ROWS,
            bucket_count: HISTOGRAM_BUCKETS,
        }
    }

    pub fn with_max_rows(mut self, max_rows: i64) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub async fn collect(
        &self,
        token: &CancelToken,
        table: &str,
        sample_rate: f64,
    ) -> Result<TableStatistics> {
        token.check()?;
        let sample_rate = sample_rate.clamp(0.0, 1.0);

        let info = match self.source.get_table_info(token, table).await {
            Ok(info) => Some(info),
            Err(err) => {
                log::debug!("table info unavailable for '{}': {}", table, err);
                None
            }
        };
        let total_rows = info
            .as_ref()
            .map(|i| i.row_count)
            .filter(|c| *c > 0)
            .unwrap_or(DEFAULT_ROW_COUNT);

        // Tables at or below the floor are sampled in full.
        let target = if total_rows <= MIN_SAMPLE_ROWS {
            total_rows
        } else {
            let scaled = (total_rows as f64 * sample_rate) as i64;
            scaled.max(MIN_SAMPLE_ROWS).min(self.max_rows)
        };

        let fetched = self
            .source
            .query(token, table, &QueryOptions::all())
            .await?;
        token.check()?;

        let stride = if target > 0 {
            (fetched.rows.len() / target as usize).max(1)
        } else {
            1
        };
        let sampled: Vec<&Row> = fetched
            .rows
            .iter()
            .step_by(stride)
            .take(target.max(1) as usize)
            .collect();

        let mut column_names: Vec<String> = Vec::new();
        for row in &sampled {
            for name in row.columns() {
                if !column_names.iter().any(|n| n == name) {
                    column_names.push(name.to_string());
                }
            }
        }
        if column_names.is_empty() {
            if let Some(info) = &info {
                column_names = info.columns.iter().map(|c| c.name.clone()).collect();
            }
        }

        let bucket_count = self.bucket_count;
        let tasks = column_names.into_iter().map(|name| {
            let values: Vec<Value> = sampled
                .iter()
                .map(|row| row.get(&name).cloned().unwrap_or(Value::Null))
                .collect();
            tokio::spawn(async move {
                let stats = column_statistics(&name, &values);
                let histogram = Histogram::equi_width(&values, bucket_count);
                (name, stats, histogram)
            })
        });

        let mut statistics = TableStatistics::new(table);
        statistics.row_count = total_rows;
        statistics.estimated_row_count = total_rows;
        statistics.sample_count = sampled.len() as i64;
        statistics.sample_ratio = if total_rows > 0 {
            sampled.len() as f64 / total_rows as f64
        } else {
            0.0
        };
        statistics.collect_ts = Utc::now();

        for joined in join_all(tasks).await {
            match joined {
                Ok((name, stats, histogram)) => {
                    statistics.columns.insert(name.clone(), stats);
                    statistics.histograms.insert(name, histogram);
                }
                Err(err) => log::warn!("column statistics task failed: {}", err),
            }
        }
        Ok(statistics)
    }
}

/// Column statistics over the sampled values. The data type comes from the
/// first non-null tag.
fn column_statistics(name: &str, values: &[Value]) -> ColumnStatistics {
    use crate::evaluator::compare_values;

    let data_type = values
        .iter()
        .find(|v| !v.is_null())
        .map(|v| v.type_name().to_string())
        .unwrap_or_else(|| "NULL".to_string());

    let null_count = values.iter().filter(|v| v.is_null()).count() as i64;
    let distinct: HashSet<String> = values
        .iter()
        .filter(|v| !v.is_null())
        .map(Value::tagged_key)
        .collect();

    let mut min = Value::Null;
    let mut max = Value::Null;
    for value in values.iter().filter(|v| !v.is_null()) {
        if min.is_null() || compare_values(value, &min) == Some(Ordering::Less) {
            min = value.clone();
        }
        if max.is_null() || compare_values(value, &max) == Some(Ordering::Greater) {
            max = value.clone();
        }
    }

    let total = values.len();
    let width_sum: usize = values.iter().map(Value::width).sum();

    ColumnStatistics {
        name: name.to_string(),
        data_type,
        distinct_count: distinct.len() as i64,
        null_count,
        min,
        max,
        null_fraction: if total > 0 {
            null_count as f64 / total as f64
        } else {
            0.0
        },
        avg_width: if total > 0 {
            width_sum as f64 / total as f64
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnInfo, TableInfo};
    use crate::datasource::MemorySource;

    fn seeded(rows: usize) -> Arc<MemorySource> {
        let source = Arc::new(MemorySource::new());
        let data: Vec<Row> = (0..rows)
            .map(|i| {
                Row::from([
                    ("id", Value::Integer(i as i64)),
                    ("grade", Value::Integer((i % 5) as i64)),
                    (
                        "label",
                        if i % 10 == 0 {
                            Value::Null
                        } else {
                            Value::Text(format!("row-{}", i))
                        },
                    ),
                ])
            })
            .collect();
        source.seed_table(
            TableInfo::new(
                "metrics",
                vec![
                    ColumnInfo::new("id", "INTEGER").primary_key(),
                    ColumnInfo::new("grade", "INTEGER"),
                    ColumnInfo::new("label", "TEXT"),
                ],
            ),
            data,
        );
        source
    }

    #[tokio::test]
    async fn test_small_table_sampled_in_full() {
        let collector = SamplingCollector::new(seeded(60));
        let token = CancelToken::new();
        let stats = collector.collect(&token, "metrics", 0.1).await.unwrap();

        assert_eq!(stats.row_count, 60);
        assert_eq!(stats.sample_count, 60);
        assert_eq!(stats.columns.len(), 3);
        assert_eq!(stats.histograms.len(), 3);

        let grade = &stats.columns["grade"];
        assert_eq!(grade.data_type, "INTEGER");
        assert_eq!(grade.distinct_count, 5);
        assert_eq!(grade.min, Value::Integer(0));
        assert_eq!(grade.max, Value::Integer(4));
    }

    #[tokio::test]
    async fn test_sample_floor_applies() {
        let collector = SamplingCollector::new(seeded(1000));
        let token = CancelToken::new();
        // 1000 * 0.01 = 10, floored to 100.
        let stats = collector.collect(&token, "metrics", 0.01).await.unwrap();
        assert_eq!(stats.sample_count, 100);
        assert!((stats.sample_ratio - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_null_fraction_and_type_inference() {
        let collector = SamplingCollector::new(seeded(100));
        let token = CancelToken::new();
        let stats = collector.collect(&token, "metrics", 1.0).await.unwrap();
        let label = &stats.columns["label"];
        assert_eq!(label.data_type, "TEXT");
        assert_eq!(label.null_count, 10);
        assert!((label.null_fraction - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_table_defaults_row_count() {
        let source = Arc::new(MemorySource::new());
        source.seed_table(TableInfo::new("only", vec![ColumnInfo::new("a", "INTEGER")]), vec![]);
        let collector = SamplingCollector::new(source);
        let token = CancelToken::new();
        // The query itself fails for a missing table; info fallback alone
        // is not enough.
        assert!(collector.collect(&token, "ghost", 0.5).await.is_err());
    }
}
