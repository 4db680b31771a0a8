//! In-memory reference implementation of the data-source port, used by the
//! test suites and as the seed source for statistics sampling.

use super::{DataSource, Filter, FilterOp, LogicOp, QueryOptions, SortOrder, WriteOptions};
use crate::core::{ColumnInfo, EngineError, Result, Row, TableInfo, Value};
use crate::evaluator::{apply_op, compare_values, values_equal};
use crate::expr::pattern;
use crate::result::QueryResult;
use crate::runtime::CancelToken;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

struct MemTable {
    info: TableInfo,
    rows: Vec<Row>,
    next_auto: i64,
}

/// RwLock-guarded table store with filter evaluation, ordering and DML.
pub struct MemorySource {
    tables: RwLock<HashMap<String, MemTable>>,
    writable: bool,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            writable: true,
        }
    }

    pub fn read_only() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            writable: false,
        }
    }

    /// Synchronous test/bootstrap helper: register a table and its rows in
    /// one call, bypassing the writability switch.
    pub fn seed_table(&self, info: TableInfo, rows: Vec<Row>) {
        let mut tables = self.tables.write().expect("table lock poisoned");
        tables.insert(
            info.name.clone(),
            MemTable {
                info,
                rows,
                next_auto: 1,
            },
        );
    }

    fn check_writable(&self, table: &str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(EngineError::NotWritable(table.to_string()))
        }
    }
}

fn field_value(row: &Row, field: &str) -> Value {
    row.get(field).cloned().unwrap_or(Value::Null)
}

fn matches_condition(row: &Row, field: &str, op: FilterOp, values: &[Value]) -> bool {
    let actual = field_value(row, field);
    match op {
        FilterOp::IsNull => actual.is_null(),
        FilterOp::IsNotNull => !actual.is_null(),
        FilterOp::In => values.iter().any(|v| values_equal(&actual, v)),
        FilterOp::Between => {
            let [low, high] = values else { return false };
            matches!(compare_values(&actual, low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare_values(&actual, high), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOp::Like => {
            let Some(pat) = values.first() else { return false };
            if actual.is_null() || pat.is_null() {
                return false;
            }
            pattern::eval_like(&actual.to_string(), &pat.to_string())
        }
        FilterOp::Eq | FilterOp::Ne | FilterOp::Gt | FilterOp::Ge | FilterOp::Lt | FilterOp::Le => {
            let Some(expected) = values.first() else { return false };
            let op = match op {
                FilterOp::Eq => "=",
                FilterOp::Ne => "!=",
                FilterOp::Gt => ">",
                FilterOp::Ge => ">=",
                FilterOp::Lt => "<",
                _ => "<=",
            };
            apply_op(op, compare_values(&actual, expected))
        }
    }
}

/// Evaluate a data-source filter against one row.
pub fn matches_filter(row: &Row, filter: &Filter) -> bool {
    match filter {
        Filter::Condition { field, op, values } => matches_condition(row, field, *op, values),
        Filter::Logic { op, sub_filters } => match op {
            LogicOp::And => sub_filters.iter().all(|f| matches_filter(row, f)),
            LogicOp::Or => sub_filters.iter().any(|f| matches_filter(row, f)),
        },
    }
}

fn apply_window(rows: &mut Vec<Row>, offset: Option<usize>, limit: Option<usize>) {
    let offset = offset.unwrap_or(0).min(rows.len());
    rows.drain(..offset);
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
}

fn project_columns(info: &TableInfo, rows: Vec<Row>, columns: &[String]) -> (Vec<ColumnInfo>, Vec<Row>) {
    let selected: Vec<ColumnInfo> = columns
        .iter()
        .map(|name| {
            info.column(name)
                .cloned()
                .unwrap_or_else(|| ColumnInfo::new(name.clone(), "TEXT"))
        })
        .collect();
    let rows = rows
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .map(|name| (name.clone(), field_value(&row, name)))
                .collect()
        })
        .collect();
    (selected, rows)
}

#[async_trait]
impl DataSource for MemorySource {
    async fn query(
        &self,
        token: &CancelToken,
        table: &str,
        options: &QueryOptions,
    ) -> Result<QueryResult> {
        token.check()?;
        let tables = self.tables.read()?;
        let mem = tables
            .get(table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))?;

        let mut rows: Vec<Row> = mem
            .rows
            .iter()
            .filter(|row| options.filters.iter().all(|f| matches_filter(row, f)))
            .cloned()
            .collect();

        if let Some(order_col) = &options.order_by {
            rows.sort_by(|a, b| {
                let ord = compare_values(&field_value(a, order_col), &field_value(b, order_col))
                    .unwrap_or(Ordering::Equal);
                match options.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        apply_window(&mut rows, options.offset, options.limit);

        if !options.select_all && !options.select_columns.is_empty() {
            let (columns, rows) = project_columns(&mem.info, rows, &options.select_columns);
            return Ok(QueryResult::new(columns, rows));
        }
        Ok(QueryResult::new(mem.info.columns.clone(), rows))
    }

    async fn insert(
        &self,
        token: &CancelToken,
        table: &str,
        rows: &[Row],
        _options: &WriteOptions,
    ) -> Result<i64> {
        token.check()?;
        self.check_writable(table)?;
        let mut tables = self.tables.write()?;
        let mem = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))?;

        for row in rows {
            let mut stored = Row::with_capacity(mem.info.columns.len());
            for col in &mem.info.columns {
                let value = match row.get(&col.name) {
                    Some(v) => v.clone(),
                    None if col.auto_increment => {
                        let next = mem.next_auto;
                        mem.next_auto += 1;
                        Value::Integer(next)
                    }
                    None => match &col.default {
                        Some(default) => default.clone(),
                        None if col.nullable => Value::Null,
                        None => {
                            return Err(EngineError::DataSource(format!(
                                "column '{}' cannot be NULL",
                                col.name
                            )));
                        }
                    },
                };
                stored.set(col.name.clone(), value);
            }
            // Names beyond the declared schema ride along untouched.
            for (name, value) in row.iter() {
                if !stored.contains(name) {
                    stored.set(name.to_string(), value.clone());
                }
            }
            mem.rows.push(stored);
        }
        mem.info.row_count = mem.rows.len() as i64;
        Ok(rows.len() as i64)
    }

    async fn update(
        &self,
        token: &CancelToken,
        table: &str,
        filters: &[Filter],
        updates: &Row,
        options: &WriteOptions,
    ) -> Result<i64> {
        token.check()?;
        self.check_writable(table)?;
        let mut tables = self.tables.write()?;
        let mem = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))?;

        let mut touched = 0i64;
        for row in mem.rows.iter_mut() {
            if let Some(bound) = options.limit {
                if touched as usize >= bound {
                    break;
                }
            }
            if filters.iter().all(|f| matches_filter(row, f)) {
                for (name, value) in updates.iter() {
                    row.set(name.to_string(), value.clone());
                }
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn delete(
        &self,
        token: &CancelToken,
        table: &str,
        filters: &[Filter],
        options: &WriteOptions,
    ) -> Result<i64> {
        token.check()?;
        self.check_writable(table)?;
        let mut tables = self.tables.write()?;
        let mem = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))?;

        let bound = options.limit.unwrap_or(usize::MAX);
        let mut removed = 0usize;
        mem.rows.retain(|row| {
            if removed >= bound {
                return true;
            }
            if filters.iter().all(|f| matches_filter(row, f)) {
                removed += 1;
                false
            } else {
                true
            }
        });
        mem.info.row_count = mem.rows.len() as i64;
        Ok(removed as i64)
    }

    async fn get_table_info(&self, token: &CancelToken, table: &str) -> Result<TableInfo> {
        token.check()?;
        let tables = self.tables.read()?;
        let mem = tables
            .get(table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))?;
        let mut info = mem.info.clone();
        info.row_count = mem.rows.len() as i64;
        Ok(info)
    }

    async fn filter(
        &self,
        token: &CancelToken,
        table: &str,
        filter: &Filter,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<QueryResult> {
        token.check()?;
        let tables = self.tables.read()?;
        let mem = tables
            .get(table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))?;
        let mut rows: Vec<Row> = mem
            .rows
            .iter()
            .filter(|row| matches_filter(row, filter))
            .cloned()
            .collect();
        apply_window(&mut rows, Some(offset), limit);
        Ok(QueryResult::new(mem.info.columns.clone(), rows))
    }

    async fn create_table(&self, token: &CancelToken, info: &TableInfo) -> Result<()> {
        token.check()?;
        self.check_writable(&info.name)?;
        let mut tables = self.tables.write()?;
        if tables.contains_key(&info.name) {
            return Err(EngineError::DataSource(format!(
                "table '{}' already exists",
                info.name
            )));
        }
        tables.insert(
            info.name.clone(),
            MemTable {
                info: info.clone(),
                rows: Vec::new(),
                next_auto: 1,
            },
        );
        Ok(())
    }

    async fn drop_table(&self, token: &CancelToken, table: &str) -> Result<()> {
        token.check()?;
        self.check_writable(table)?;
        let mut tables = self.tables.write()?;
        tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))
    }

    async fn truncate_table(&self, token: &CancelToken, table: &str) -> Result<()> {
        token.check()?;
        self.check_writable(table)?;
        let mut tables = self.tables.write()?;
        let mem = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", table)))?;
        mem.rows.clear();
        mem.info.row_count = 0;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn is_connected(&self) -> bool {
        true
    }
}
