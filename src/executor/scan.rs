use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, Result};
use crate::datasource::QueryOptions;
use crate::plan::TableScanConfig;
use crate::result::QueryResult;
use async_trait::async_trait;

/// Leaf operator: translates its config into one data-source query and
/// passes the result through untouched. Data-source errors surface
/// verbatim.
pub struct TableScanOperator {
    config: TableScanConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl TableScanOperator {
    pub fn new(config: TableScanConfig, schema: Vec<ColumnInfo>) -> Self {
        Self {
            config,
            children: Vec::new(),
            schema,
        }
    }
}

#[async_trait]
impl Operator for TableScanOperator {
    fn name(&self) -> &'static str {
        "TableScan"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        let options = QueryOptions {
            select_all: self.config.columns.is_empty(),
            select_columns: self.config.columns.clone(),
            filters: self.config.filters.clone(),
            limit: self.config.limit,
            offset: self.config.offset,
            ..Default::default()
        };
        let result = ctx.source.query(&ctx.token, &self.config.table, &options).await?;
        ctx.check_cancelled()?;
        Ok(result)
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}
