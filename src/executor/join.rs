use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result, Row, Value};
use crate::plan::{HashJoinConfig, JoinType};
use crate::result::QueryResult;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Hash join: build a hash table on one side, probe with the other.
/// Keys are canonical type-tagged value strings joined by `|`, so
/// Integer(1) and Text("1") land in different buckets.
pub struct HashJoinOperator {
    config: HashJoinConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl HashJoinOperator {
    pub fn new(config: HashJoinConfig, children: Vec<Box<dyn Operator>>) -> Self {
        let schema = match config.join_type {
            JoinType::Semi | JoinType::Anti => children[0].schema().to_vec(),
            _ => merge_columns(children[0].schema(), children[1].schema()),
        };
        Self {
            config,
            children,
            schema,
        }
    }

    fn left_cols(&self) -> Vec<&str> {
        self.config.left_conds.iter().map(|c| c.column.as_str()).collect()
    }

    fn right_cols(&self) -> Vec<&str> {
        self.config.right_conds.iter().map(|c| c.column.as_str()).collect()
    }
}

/// Composite hash key over the given columns. Missing columns key as NULL.
fn multi_key(row: &Row, cols: &[&str]) -> String {
    cols.iter()
        .map(|col| row.get(col).cloned().unwrap_or(Value::Null).tagged_key())
        .collect::<Vec<_>>()
        .join("|")
}

/// Left columns first and unchanged; right columns appended, renamed
/// `right_<name>` on collision.
fn merge_rows(left: &Row, right: &Row) -> Row {
    let mut merged = left.clone();
    for (name, value) in right.iter() {
        if merged.contains(name) {
            merged.set(format!("right_{}", name), value.clone());
        } else {
            merged.set(name.to_string(), value.clone());
        }
    }
    merged
}

fn merge_columns(left: &[ColumnInfo], right: &[ColumnInfo]) -> Vec<ColumnInfo> {
    let mut merged = left.to_vec();
    let taken: HashSet<String> = left.iter().map(|c| c.name.clone()).collect();
    for col in right {
        let mut col = col.clone();
        if taken.contains(&col.name) {
            col.name = format!("right_{}", col.name);
        }
        merged.push(col);
    }
    merged
}

/// A row padded with NULL for every column of the missing side.
fn null_row(columns: &[ColumnInfo]) -> Row {
    columns
        .iter()
        .map(|c| (c.name.clone(), Value::Null))
        .collect()
}

fn build_table(rows: &[Row], cols: &[&str]) -> HashMap<String, Vec<usize>> {
    let mut table: HashMap<String, Vec<usize>> = HashMap::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        table.entry(multi_key(row, cols)).or_default().push(idx);
    }
    table
}

#[async_trait]
impl Operator for HashJoinOperator {
    fn name(&self) -> &'static str {
        "HashJoin"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        let left = self.children[0]
            .execute(ctx)
            .await
            .map_err(|e| e.with_operator(self.name()))?;
        ctx.check_cancelled()?;
        let right = self.children[1]
            .execute(ctx)
            .await
            .map_err(|e| e.with_operator(self.name()))?;
        ctx.check_cancelled()?;

        let left_cols = self.left_cols();
        let right_cols = self.right_cols();

        let mut out: Vec<Row> = Vec::new();
        match self.config.join_type {
            JoinType::Cross => {
                for l in &left.rows {
                    for r in &right.rows {
                        out.push(merge_rows(l, r));
                    }
                }
            }
            JoinType::Inner => {
                let table = build_table(&right.rows, &right_cols);
                for l in &left.rows {
                    if let Some(matches) = table.get(&multi_key(l, &left_cols)) {
                        for &idx in matches {
                            out.push(merge_rows(l, &right.rows[idx]));
                        }
                    }
                }
            }
            JoinType::Left => {
                let table = build_table(&right.rows, &right_cols);
                let pad = null_row(&right.columns);
                for l in &left.rows {
                    match table.get(&multi_key(l, &left_cols)) {
                        Some(matches) => {
                            for &idx in matches {
                                out.push(merge_rows(l, &right.rows[idx]));
                            }
                        }
                        None => out.push(merge_rows(l, &pad)),
                    }
                }
            }
            JoinType::Right => {
                // Build from the left, probe from the right.
                let table = build_table(&left.rows, &left_cols);
                let pad = null_row(&left.columns);
                for r in &right.rows {
                    match table.get(&multi_key(r, &right_cols)) {
                        Some(matches) => {
                            for &idx in matches {
                                out.push(merge_rows(&left.rows[idx], r));
                            }
                        }
                        None => out.push(merge_rows(&pad, r)),
                    }
                }
            }
            JoinType::Full => {
                let table = build_table(&right.rows, &right_cols);
                let right_pad = null_row(&right.columns);
                let mut matched: HashSet<usize> = HashSet::new();
                for l in &left.rows {
                    match table.get(&multi_key(l, &left_cols)) {
                        Some(matches) => {
                            for &idx in matches {
                                matched.insert(idx);
                                out.push(merge_rows(l, &right.rows[idx]));
                            }
                        }
                        None => out.push(merge_rows(l, &right_pad)),
                    }
                }
                let left_pad = null_row(&left.columns);
                for (idx, r) in right.rows.iter().enumerate() {
                    if !matched.contains(&idx) {
                        out.push(merge_rows(&left_pad, r));
                    }
                }
            }
            JoinType::Semi => {
                let table = build_table(&right.rows, &right_cols);
                for l in &left.rows {
                    if table.contains_key(&multi_key(l, &left_cols)) {
                        out.push(l.clone());
                    }
                }
            }
            JoinType::Anti => {
                let table = build_table(&right.rows, &right_cols);
                for l in &left.rows {
                    if !table.contains_key(&multi_key(l, &left_cols)) {
                        out.push(l.clone());
                    }
                }
            }
        }

        let columns = match self.config.join_type {
            JoinType::Semi | JoinType::Anti => left.columns,
            _ => merge_columns(&left.columns, &right.columns),
        };
        Ok(QueryResult::new(columns, out))
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}
