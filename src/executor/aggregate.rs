use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result, Row, Value};
use crate::evaluator::{compare_values, eval};
use crate::plan::{AggFunc, AggregateConfig, AggregateType};
use crate::result::QueryResult;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Hash aggregation with GROUP BY. Group keys are the printable group
/// column values joined by `|`; an empty group-by list forms a single
/// global group. Non-coercible inputs are skipped per aggregate rather
/// than erroring, matching permissive SQL dialects.
pub struct AggregateOperator {
    config: AggregateConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

struct Group {
    keys: Vec<(String, Value)>,
    slots: Row,
}

impl AggregateOperator {
    pub fn new(config: AggregateConfig, children: Vec<Box<dyn Operator>>) -> Self {
        let mut op = Self {
            config,
            children,
            schema: Vec::new(),
        };
        let aliases = op.aliases();
        op.schema = op.output_columns(&aliases, op.children[0].schema());
        op
    }

    /// Slot name for an aggregate: the alias, or `agg_<i>` from the
    /// aggregate's index in the config (never the group size).
    fn aliases(&self) -> Vec<String> {
        self.config
            .agg_funcs
            .iter()
            .enumerate()
            .map(|(i, agg)| {
                if agg.alias.is_empty() {
                    format!("agg_{}", i)
                } else {
                    agg.alias.clone()
                }
            })
            .collect()
    }

    fn output_columns(&self, aliases: &[String], input_columns: &[ColumnInfo]) -> Vec<ColumnInfo> {
        let mut columns: Vec<ColumnInfo> = self
            .config
            .group_by_cols
            .iter()
            .map(|name| ColumnInfo::new(name.clone(), "TEXT"))
            .collect();
        for (agg, alias) in self.config.agg_funcs.iter().zip(aliases) {
            let data_type = match agg.func {
                AggregateType::Count => "INTEGER".to_string(),
                AggregateType::Sum | AggregateType::Avg => "DOUBLE".to_string(),
                AggregateType::Min | AggregateType::Max => agg
                    .expr
                    .as_ref()
                    .and_then(|e| e.as_column())
                    .and_then(|name| input_columns.iter().find(|c| c.name == name))
                    .map(|c| c.data_type.clone())
                    .unwrap_or_else(|| "TEXT".to_string()),
            };
            columns.push(ColumnInfo::new(alias.clone(), data_type));
        }
        columns
    }
}

fn group_key(row: &Row, cols: &[String]) -> String {
    cols.iter()
        .map(|col| row.get(col).cloned().unwrap_or(Value::Null).to_string())
        .collect::<Vec<_>>()
        .join("|")
}

fn new_group(row: &Row, config: &AggregateConfig, aliases: &[String]) -> Group {
    let keys = config
        .group_by_cols
        .iter()
        .map(|col| (col.clone(), row.get(col).cloned().unwrap_or(Value::Null)))
        .collect();
    let mut slots = Row::new();
    for (agg, alias) in config.agg_funcs.iter().zip(aliases) {
        if agg.func == AggregateType::Count {
            slots.set(alias.clone(), Value::Integer(0));
        }
    }
    Group { keys, slots }
}

fn accumulate(group: &mut Group, agg: &AggFunc, alias: &str, row: &Row) {
    match agg.func {
        AggregateType::Count => {
            let counted = match &agg.expr {
                None => true,
                Some(expr) => !eval(row, expr).is_null(),
            };
            if counted {
                let current = group
                    .slots
                    .get(alias)
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                group.slots.set(alias.to_string(), Value::Integer(current + 1));
            }
        }
        AggregateType::Sum => {
            if let Some(addend) = agg.expr.as_ref().and_then(|e| eval(row, e).as_f64()) {
                let current = group
                    .slots
                    .get(alias)
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                group.slots.set(alias.to_string(), Value::Float(current + addend));
            }
        }
        AggregateType::Avg => {
            if let Some(addend) = agg.expr.as_ref().and_then(|e| eval(row, e).as_f64()) {
                let sum_slot = format!("{}_sum", alias);
                let count_slot = format!("{}_count", alias);
                let sum = group.slots.get(&sum_slot).and_then(Value::as_f64).unwrap_or(0.0);
                let count = group
                    .slots
                    .get(&count_slot)
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                group.slots.set(sum_slot, Value::Float(sum + addend));
                group.slots.set(count_slot, Value::Integer(count + 1));
            }
        }
        AggregateType::Min | AggregateType::Max => {
            let Some(value) = agg.expr.as_ref().map(|e| eval(row, e)) else {
                return;
            };
            if value.is_null() {
                return;
            }
            let winner = match group.slots.get(alias) {
                None => true,
                Some(current) => {
                    let want = if agg.func == AggregateType::Min {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    };
                    compare_values(&value, current) == Some(want)
                }
            };
            if winner {
                group.slots.set(alias.to_string(), value);
            }
        }
    }
}

/// Final pass for one group: group columns first, then one value per
/// aggregate. AVG divides its internal sum/count slots here; the internal
/// slots never reach the output row, and an empty group averages to NULL.
fn finish_group(group: Group, config: &AggregateConfig, aliases: &[String]) -> Row {
    let mut row = Row::with_capacity(group.keys.len() + aliases.len());
    for (name, value) in group.keys {
        row.set(name, value);
    }
    for (agg, alias) in config.agg_funcs.iter().zip(aliases) {
        let value = if agg.func == AggregateType::Avg {
            let sum = group
                .slots
                .get(&format!("{}_sum", alias))
                .and_then(Value::as_f64);
            let count = group
                .slots
                .get(&format!("{}_count", alias))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            match (sum, count) {
                (Some(sum), count) if count > 0 => Value::Float(sum / count as f64),
                _ => Value::Null,
            }
        } else {
            group.slots.get(alias).cloned().unwrap_or(Value::Null)
        };
        row.set(alias.clone(), value);
    }
    row
}

#[async_trait]
impl Operator for AggregateOperator {
    fn name(&self) -> &'static str {
        "Aggregate"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        let input = self.children[0]
            .execute(ctx)
            .await
            .map_err(|e| e.with_operator(self.name()))?;
        ctx.check_cancelled()?;

        let aliases = self.aliases();
        let mut groups: HashMap<String, Group> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        if self.config.group_by_cols.is_empty() {
            // Single global group, present even over zero input rows.
            let key = String::new();
            groups.insert(key.clone(), new_group(&Row::new(), &self.config, &aliases));
            order.push(key);
        }

        for row in &input.rows {
            let key = group_key(row, &self.config.group_by_cols);
            let group = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                new_group(row, &self.config, &aliases)
            });
            for (agg, alias) in self.config.agg_funcs.iter().zip(&aliases) {
                accumulate(group, agg, alias, row);
            }
        }

        let columns = self.output_columns(&aliases, &input.columns);
        let rows: Vec<Row> = order
            .into_iter()
            .filter_map(|key| groups.remove(&key))
            .map(|group| finish_group(group, &self.config, &aliases))
            .collect();

        Ok(QueryResult::new(columns, rows))
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}
