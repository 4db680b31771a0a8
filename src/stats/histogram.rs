use crate::core::Value;
use crate::datasource::FilterOp;
use crate::evaluator::compare_values;
use crate::expr::pattern;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistogramKind {
    /// Sorted values sliced into equal-count buckets.
    EquiWidth,
    /// Distinct values ranked by frequency, partitioned into buckets.
    Frequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub lower: Value,
    pub upper: Value,
    pub count: i64,
    pub ndv: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    pub kind: HistogramKind,
    pub buckets: Vec<Bucket>,
    pub min: Value,
    pub max: Value,
    pub ndv: i64,
    /// Stored separately; never part of `total_count`.
    pub null_count: i64,
    pub bucket_count: usize,
}

impl Histogram {
    /// Sum of bucket counts. NULLs are excluded by construction.
    pub fn total_count(&self) -> i64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Build an equi-width histogram: drop nulls, sort, slice into up to
    /// `bucket_count` equal-count runs with the last run absorbing the
    /// remainder.
    pub fn equi_width(values: &[Value], bucket_count: usize) -> Histogram {
        let null_count = values.iter().filter(|v| v.is_null()).count() as i64;
        let mut sorted: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
        sorted.sort_by(|a, b| compare_values(a, b).unwrap_or(Ordering::Equal));

        let ndv = distinct_count(&sorted);
        let mut histogram = Histogram {
            kind: HistogramKind::EquiWidth,
            buckets: Vec::new(),
            min: sorted.first().cloned().unwrap_or(Value::Null),
            max: sorted.last().cloned().unwrap_or(Value::Null),
            ndv,
            null_count,
            bucket_count,
        };
        if sorted.is_empty() || bucket_count == 0 {
            return histogram;
        }

        let slice_len = (sorted.len() / bucket_count).max(1);
        let mut start = 0;
        for i in 0..bucket_count {
            if start >= sorted.len() {
                break;
            }
            let end = if i == bucket_count - 1 {
                sorted.len()
            } else {
                (start + slice_len).min(sorted.len())
            };
            let slice = &sorted[start..end];
            histogram.buckets.push(Bucket {
                lower: slice[0].clone(),
                upper: slice[slice.len() - 1].clone(),
                count: slice.len() as i64,
                ndv: distinct_count(slice),
            });
            start = end;
        }
        histogram
    }

    /// Build a frequency histogram: rank distinct values by frequency,
    /// partition the ranking into `bucket_count` segments. Buckets keep
    /// the value-range bounds of their segment so selectivity lookups can
    /// share the bucket-interaction path with equi-width histograms.
    pub fn frequency(values: &[Value], bucket_count: usize) -> Histogram {
        let null_count = values.iter().filter(|v| v.is_null()).count() as i64;
        let mut freq: HashMap<String, (Value, i64)> = HashMap::new();
        for value in values.iter().filter(|v| !v.is_null()) {
            let entry = freq
                .entry(value.tagged_key())
                .or_insert_with(|| (value.clone(), 0));
            entry.1 += 1;
        }

        let mut ranked: Vec<(Value, i64)> = freq.into_values().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.tagged_key().cmp(&b.0.tagged_key())));

        let (min, max) = min_max(values);
        let mut histogram = Histogram {
            kind: HistogramKind::Frequency,
            buckets: Vec::new(),
            min,
            max,
            ndv: ranked.len() as i64,
            null_count,
            bucket_count,
        };
        if ranked.is_empty() || bucket_count == 0 {
            return histogram;
        }

        let seg_len = (ranked.len() / bucket_count).max(1);
        let mut start = 0;
        for i in 0..bucket_count {
            if start >= ranked.len() {
                break;
            }
            let end = if i == bucket_count - 1 {
                ranked.len()
            } else {
                (start + seg_len).min(ranked.len())
            };
            let segment = &ranked[start..end];
            let (lower, upper) = min_max_pairs(segment);
            histogram.buckets.push(Bucket {
                lower,
                upper,
                count: segment.iter().map(|(_, c)| c).sum(),
                ndv: segment.len() as i64,
            });
            start = end;
        }
        histogram
    }

    fn covering_bucket(&self, value: &Value) -> Option<&Bucket> {
        self.buckets.iter().find(|b| {
            matches!(
                compare_values(value, &b.lower),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(
                compare_values(value, &b.upper),
                Some(Ordering::Less | Ordering::Equal)
            )
        })
    }

    fn equality_selectivity(&self, value: &Value) -> f64 {
        let total = self.total_count();
        if total == 0 || self.ndv == 0 {
            return 0.0;
        }
        match self.covering_bucket(value) {
            None => 0.0,
            Some(bucket) => {
                let by_ndv = bucket.ndv as f64 / self.ndv as f64;
                let by_count = bucket.count as f64 / total as f64;
                by_ndv.min(by_count)
            }
        }
    }

    /// Fraction of buckets whose range interacts with `value` under the
    /// operator; linear interpolation between min and max when no bucket
    /// interacts. A value below the minimum with `>` estimates 1.0, above
    /// the maximum 0.0, and symmetrically for `<`.
    fn range_selectivity(&self, op: FilterOp, value: &Value) -> f64 {
        if self.buckets.is_empty() {
            return self.linear_fraction(op, value);
        }
        let interacting = self
            .buckets
            .iter()
            .filter(|b| match op {
                FilterOp::Gt => compare_values(&b.upper, value) == Some(Ordering::Greater),
                FilterOp::Ge => matches!(
                    compare_values(&b.upper, value),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                FilterOp::Lt => compare_values(&b.lower, value) == Some(Ordering::Less),
                FilterOp::Le => matches!(
                    compare_values(&b.lower, value),
                    Some(Ordering::Less | Ordering::Equal)
                ),
                _ => false,
            })
            .count();
        if interacting == 0 {
            return self.linear_fraction(op, value);
        }
        interacting as f64 / self.buckets.len() as f64
    }

    fn linear_fraction(&self, op: FilterOp, value: &Value) -> f64 {
        let (Some(min), Some(max), Some(v)) = (self.min.as_f64(), self.max.as_f64(), value.as_f64())
        else {
            return 0.3;
        };
        let span = max - min;
        if span <= 0.0 {
            return 0.3;
        }
        let fraction = match op {
            FilterOp::Gt | FilterOp::Ge => (max - v) / span,
            FilterOp::Lt | FilterOp::Le => (v - min) / span,
            _ => 0.3,
        };
        fraction.clamp(0.0, 1.0)
    }

    /// Selectivity estimate for a leaf filter against this column.
    pub fn estimate_selectivity(&self, op: FilterOp, values: &[Value]) -> f64 {
        match op {
            FilterOp::Eq => values.first().map_or(0.0, |v| self.equality_selectivity(v)),
            FilterOp::Ne => values
                .first()
                .map_or(1.0, |v| (1.0 - self.equality_selectivity(v)).max(0.0)),
            FilterOp::Gt | FilterOp::Ge | FilterOp::Lt | FilterOp::Le => values
                .first()
                .map_or(0.3, |v| self.range_selectivity(op, v)),
            FilterOp::In => {
                if self.buckets.is_empty() || self.ndv == 0 {
                    return 0.2;
                }
                let covered = values
                    .iter()
                    .filter(|v| self.covering_bucket(v).is_some())
                    .count();
                let distinct_in: HashSet<String> = values.iter().map(|v| v.tagged_key()).collect();
                let bucket_frac = covered as f64 / self.buckets.len() as f64;
                let ndv_frac = (distinct_in.len() as f64 / self.ndv as f64).min(1.0);
                (bucket_frac * ndv_frac).clamp(0.0, 1.0)
            }
            FilterOp::Between => {
                let [low, high] = values else { return 0.3 };
                self.range_selectivity(FilterOp::Ge, low) * self.range_selectivity(FilterOp::Le, high)
            }
            FilterOp::Like => {
                let Some(Value::Text(pat)) = values.first() else {
                    return 0.25;
                };
                let prefix = pattern::literal_prefix_len(pat);
                if prefix > 0 {
                    (1.0 - 0.9f64.powi(prefix as i32)).min(0.8)
                } else {
                    0.25
                }
            }
            FilterOp::IsNull => {
                let seen = self.total_count() + self.null_count;
                if seen == 0 {
                    0.0
                } else {
                    self.null_count as f64 / seen as f64
                }
            }
            FilterOp::IsNotNull => 1.0 - self.estimate_selectivity(FilterOp::IsNull, values),
        }
    }
}

fn distinct_count(values: &[Value]) -> i64 {
    values
        .iter()
        .map(Value::tagged_key)
        .collect::<HashSet<_>>()
        .len() as i64
}

fn min_max(values: &[Value]) -> (Value, Value) {
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
    (min, max)
}

fn min_max_pairs(segment: &[(Value, i64)]) -> (Value, Value) {
    let values: Vec<Value> = segment.iter().map(|(v, _)| v.clone()).collect();
    min_max(&values)
}
