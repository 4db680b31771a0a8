use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result, Row, Value};
use crate::plan::UnionConfig;
use crate::result::QueryResult;
use async_trait::async_trait;
use std::collections::HashSet;

/// Vertical union of the child results. The first child defines the output
/// schema; with `distinct`, rows dedup on a canonical name-sorted key.
pub struct UnionOperator {
    config: UnionConfig,
    children: Vec<Box<dyn Operator>>,
}

impl UnionOperator {
    pub fn new(config: UnionConfig, children: Vec<Box<dyn Operator>>) -> Self {
        Self { config, children }
    }
}

/// Canonical dedup key: column names sorted, then `name:value|` per entry,
/// with the type-tagged value rendering so 1 and "1" stay distinct.
fn distinct_key(row: &Row) -> String {
    let mut names: Vec<&str> = row.columns().collect();
    names.sort_unstable();
    let mut key = String::new();
    for name in names {
        let value = row.get(name).cloned().unwrap_or(Value::Null);
        key.push_str(name);
        key.push(':');
        key.push_str(&value.tagged_key());
        key.push('|');
    }
    key
}

#[async_trait]
impl Operator for UnionOperator {
    fn name(&self) -> &'static str {
        "Union"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        let mut parts = Vec::with_capacity(self.children.len());
        for child in &self.children {
            ctx.check_cancelled()?;
            let part = child
                .execute(ctx)
                .await
                .map_err(|e| e.with_operator(self.name()))?;
            parts.push(part);
        }
        ctx.check_cancelled()?;

        let mut merged = QueryResult::concat(parts);
        if self.config.distinct {
            let mut seen: HashSet<String> = HashSet::with_capacity(merged.rows.len());
            merged.rows.retain(|row| seen.insert(distinct_key(row)));
            merged.total = merged.rows.len() as i64;
        }
        Ok(merged)
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        self.children[0].schema()
    }
}
