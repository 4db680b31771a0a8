use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result};
use crate::evaluator::eval_predicate;
use crate::expr::{Expr, normalize_op};
use crate::plan::SelectionConfig;
use crate::result::QueryResult;
use async_trait::async_trait;

/// Filter operator: keeps the rows satisfying the condition expression.
pub struct SelectionOperator {
    config: SelectionConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl SelectionOperator {
    pub fn new(
        config: SelectionConfig,
        children: Vec<Box<dyn Operator>>,
        schema: Vec<ColumnInfo>,
    ) -> Self {
        Self {
            config,
            children,
            schema,
        }
    }
}

/// The subject column when the condition is a single leaf predicate over a
/// plain column; such executions feed the optimizer feedback stream.
fn simple_column_subject(condition: &Expr) -> Option<&str> {
    let Expr::Operator { op, left, .. } = condition else {
        return None;
    };
    match normalize_op(op).as_str() {
        "and" | "or" => None,
        _ => left.as_deref().and_then(Expr::as_column),
    }
}

#[async_trait]
impl Operator for SelectionOperator {
    fn name(&self) -> &'static str {
        "Selection"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        let input = self.children[0]
            .execute(ctx)
            .await
            .map_err(|e| e.with_operator(self.name()))?;
        ctx.check_cancelled()?;

        let examined = input.rows.len();
        // Typical selectivity sizing: half the input plus one.
        let mut kept = Vec::with_capacity(examined / 2 + 1);
        for row in input.rows {
            if eval_predicate(&row, &self.config.condition) {
                kept.push(row);
            }
        }

        if let Some(column) = simple_column_subject(&self.config.condition) {
            ctx.feedback
                .record(column, examined as u64, kept.len() as u64);
        }

        Ok(QueryResult::new(input.columns, kept))
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        if self.schema.is_empty() {
            self.children[0].schema()
        } else {
            &self.schema
        }
    }
}
