use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result, Row};
use crate::evaluator::eval;
use crate::expr::Expr;
use crate::plan::ProjectionConfig;
use crate::result::QueryResult;
use async_trait::async_trait;

/// Projection: selects and renames columns. Output types are TEXT
/// placeholders; real typing needs schema propagation that belongs to the
/// caller.
pub struct ProjectionOperator {
    config: ProjectionConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl ProjectionOperator {
    pub fn new(config: ProjectionConfig, children: Vec<Box<dyn Operator>>) -> Self {
        let schema = output_columns(&config);
        Self {
            config,
            children,
            schema,
        }
    }

    fn alias(&self, index: usize) -> &str {
        self.config.aliases.get(index).map(String::as_str).unwrap_or("")
    }

    /// Pass-through applies when every expression is a plain unaliased
    /// column and at least as many expressions as the child has columns:
    /// nothing to trim, nothing to rename.
    fn is_pass_through(&self, child_columns: usize) -> bool {
        self.config.expressions.len() >= child_columns
            && self
                .config
                .expressions
                .iter()
                .enumerate()
                .all(|(i, expr)| expr.as_column().is_some() && self.alias(i).is_empty())
    }

    /// Rows may carry names the child schema never declared (hidden
    /// bookkeeping fields). Those must not survive an explicit projection,
    /// so pass-through is only taken when every row stays inside the
    /// projected name set.
    fn rows_within(rows: &[Row], names: &[String]) -> bool {
        rows.iter()
            .all(|row| row.columns().all(|n| names.iter().any(|p| p == n)))
    }
}

fn output_name(config: &ProjectionConfig, index: usize) -> String {
    let alias = config.aliases.get(index).map(String::as_str).unwrap_or("");
    if !alias.is_empty() {
        return alias.to_string();
    }
    match &config.expressions[index] {
        Expr::Column(name) => name.clone(),
        _ => format!("col_{}", index),
    }
}

fn output_columns(config: &ProjectionConfig) -> Vec<ColumnInfo> {
    (0..config.expressions.len())
        .map(|i| ColumnInfo::new(output_name(config, i), "TEXT"))
        .collect()
}

#[async_trait]
impl Operator for ProjectionOperator {
    fn name(&self) -> &'static str {
        "Projection"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        let input = self.children[0]
            .execute(ctx)
            .await
            .map_err(|e| e.with_operator(self.name()))?;
        ctx.check_cancelled()?;

        let columns = self.schema.clone();
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        if self.is_pass_through(input.columns.len()) && Self::rows_within(&input.rows, &names) {
            return Ok(QueryResult {
                total: input.total,
                columns,
                rows: input.rows,
            });
        }
        let rows: Vec<Row> = input
            .rows
            .into_iter()
            .map(|row| {
                self.config
                    .expressions
                    .iter()
                    .enumerate()
                    .map(|(i, expr)| (names[i].clone(), eval(&row, expr)))
                    .collect()
            })
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
