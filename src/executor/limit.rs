use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result};
use crate::plan::LimitConfig;
use crate::result::QueryResult;
use async_trait::async_trait;

/// LIMIT/OFFSET over the buffered child result. The offset clamps into
/// [0, len]; a negative limit means everything after the offset.
pub struct LimitOperator {
    config: LimitConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl LimitOperator {
    pub fn new(config: LimitConfig, children: Vec<Box<dyn Operator>>, schema: Vec<ColumnInfo>) -> Self {
        Self {
            config,
            children,
            schema,
        }
    }
}

#[async_trait]
impl Operator for LimitOperator {
    fn name(&self) -> &'static str {
        "Limit"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        let mut input = self.children[0]
            .execute(ctx)
            .await
            .map_err(|e| e.with_operator(self.name()))?;
        ctx.check_cancelled()?;

        let len = input.rows.len();
        let offset = self.config.offset.clamp(0, len as i64) as usize;
        let end = if self.config.limit < 0 {
            len
        } else {
            (offset + self.config.limit as usize).min(len)
        };

        input.rows.drain(end..);
        input.rows.drain(..offset);
        input.total = input.rows.len() as i64;
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
