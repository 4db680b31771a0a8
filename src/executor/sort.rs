use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result};
use crate::datasource::SortOrder;
use crate::evaluator::{compare_values, eval};
use crate::plan::SortConfig;
use crate::result::QueryResult;
use async_trait::async_trait;
use std::cmp::Ordering;

/// Stable multi-key sort over a buffered copy of the child rows. Only
/// column-reference keys participate; anything else compares equal and the
/// next key decides.
pub struct SortOperator {
    config: SortConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl SortOperator {
    pub fn new(config: SortConfig, children: Vec<Box<dyn Operator>>, schema: Vec<ColumnInfo>) -> Self {
        Self {
            config,
            children,
            schema,
        }
    }
}

#[async_trait]
impl Operator for SortOperator {
    fn name(&self) -> &'static str {
        "Sort"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        let mut input = self.children[0]
            .execute(ctx)
            .await
            .map_err(|e| e.with_operator(self.name()))?;
        ctx.check_cancelled()?;

        if self.config.order_by.is_empty() {
            return Ok(input);
        }

        input.rows.sort_by(|a, b| {
            for item in &self.config.order_by {
                if item.expr.as_column().is_none() {
                    continue;
                }
                let ord = compare_values(&eval(a, &item.expr), &eval(b, &item.expr))
                    .unwrap_or(Ordering::Equal);
                let ord = match item.direction {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(input)
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
