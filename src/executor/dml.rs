use super::{ExecutionContext, Operator};
use crate::core::{ColumnInfo, EngineError, Result, Value};
use crate::datasource::{Filter, FilterOp, LogicOp, WriteOptions};
use crate::expr::{Expr, normalize_op};
use crate::plan::{DeleteConfig, InsertConfig, UpdateConfig};
use crate::result::QueryResult;
use async_trait::async_trait;

/// Recursively translate a WHERE expression into the data-source filter
/// form. Logical operators map one-to-one; IN carries its candidate list,
/// BETWEEN carries `[min, max]`.
pub fn translate_filter(expr: &Expr) -> Result<Filter> {
    let Expr::Operator { op, left, right } = expr else {
        return Err(EngineError::Unsupported(format!(
            "cannot translate expression to filter: {:?}",
            expr
        )));
    };
    let op = normalize_op(op);

    if let "and" | "or" = op.as_str() {
        let (Some(left), Some(right)) = (left.as_deref(), right.as_deref()) else {
            return Err(EngineError::Unsupported("logical operator missing operand".into()));
        };
        let logic_op = if op == "and" { LogicOp::And } else { LogicOp::Or };
        return Ok(Filter::Logic {
            op: logic_op,
            sub_filters: vec![translate_filter(left)?, translate_filter(right)?],
        });
    }

    let field = left
        .as_deref()
        .and_then(Expr::as_column)
        .ok_or_else(|| EngineError::Unsupported(format!("filter subject must be a column: {:?}", left)))?
        .to_string();

    let (filter_op, values) = match op.as_str() {
        "is null" => (FilterOp::IsNull, Vec::new()),
        "is not null" => (FilterOp::IsNotNull, Vec::new()),
        "in" => (FilterOp::In, literal_list(right.as_deref())?),
        "between" => {
            let values = literal_list(right.as_deref())?;
            if values.len() != 2 {
                return Err(EngineError::Unsupported("BETWEEN needs [min, max]".into()));
            }
            (FilterOp::Between, values)
        }
        "like" => (FilterOp::Like, vec![literal_value(right.as_deref())?]),
        "=" | "==" | "eq" => (FilterOp::Eq, vec![literal_value(right.as_deref())?]),
        "!=" | "<>" | "ne" => (FilterOp::Ne, vec![literal_value(right.as_deref())?]),
        ">" | "gt" => (FilterOp::Gt, vec![literal_value(right.as_deref())?]),
        ">=" | "gte" => (FilterOp::Ge, vec![literal_value(right.as_deref())?]),
        "<" | "lt" => (FilterOp::Lt, vec![literal_value(right.as_deref())?]),
        "<=" | "lte" => (FilterOp::Le, vec![literal_value(right.as_deref())?]),
        other => {
            return Err(EngineError::Unsupported(format!(
                "operator '{}' has no data-source filter form",
                other
            )));
        }
    };

    Ok(Filter::Condition {
        field,
        op: filter_op,
        values,
    })
}

fn literal_value(expr: Option<&Expr>) -> Result<Value> {
    match expr {
        Some(Expr::Literal(v)) => Ok(v.clone()),
        other => Err(EngineError::Unsupported(format!(
            "filter value must be a literal: {:?}",
            other
        ))),
    }
}

fn literal_list(expr: Option<&Expr>) -> Result<Vec<Value>> {
    match expr {
        Some(Expr::List(items)) => items.iter().map(|e| literal_value(Some(e))).collect(),
        other => Err(EngineError::Unsupported(format!(
            "filter value must be a list: {:?}",
            other
        ))),
    }
}

fn translated(filter: &Option<Expr>) -> Result<Vec<Filter>> {
    match filter {
        None => Ok(Vec::new()),
        Some(expr) => Ok(vec![translate_filter(expr)?]),
    }
}

fn check_writable(ctx: &ExecutionContext, table: &str) -> Result<()> {
    if ctx.source.is_writable() {
        Ok(())
    } else {
        Err(EngineError::NotWritable(table.to_string()))
    }
}

pub struct InsertOperator {
    config: InsertConfig,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl InsertOperator {
    pub fn new(config: InsertConfig, children: Vec<Box<dyn Operator>>) -> Self {
        Self {
            config,
            children,
            schema: Vec::new(),
        }
    }
}

#[async_trait]
impl Operator for InsertOperator {
    fn name(&self) -> &'static str {
        "Insert"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        check_writable(ctx, &self.config.table)?;
        let count = ctx
            .source
            .insert(
                &ctx.token,
                &self.config.table,
                &self.config.rows,
                &WriteOptions::default(),
            )
            .await?;
        Ok(QueryResult::affected(count))
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}

pub struct UpdateOperator {
    config: UpdateConfig,
    filters: Vec<Filter>,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl UpdateOperator {
    pub fn new(config: UpdateConfig, children: Vec<Box<dyn Operator>>) -> Result<Self> {
        let filters = translated(&config.filter)?;
        Ok(Self {
            config,
            filters,
            children,
            schema: Vec::new(),
        })
    }
}

#[async_trait]
impl Operator for UpdateOperator {
    fn name(&self) -> &'static str {
        "Update"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        check_writable(ctx, &self.config.table)?;
        let count = ctx
            .source
            .update(
                &ctx.token,
                &self.config.table,
                &self.filters,
                &self.config.updates,
                &WriteOptions::default(),
            )
            .await?;
        Ok(QueryResult::affected(count))
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}

pub struct DeleteOperator {
    config: DeleteConfig,
    filters: Vec<Filter>,
    children: Vec<Box<dyn Operator>>,
    schema: Vec<ColumnInfo>,
}

impl DeleteOperator {
    pub fn new(config: DeleteConfig, children: Vec<Box<dyn Operator>>) -> Result<Self> {
        let filters = translated(&config.filter)?;
        Ok(Self {
            config,
            filters,
            children,
            schema: Vec::new(),
        })
    }
}

#[async_trait]
impl Operator for DeleteOperator {
    fn name(&self) -> &'static str {
        "Delete"
    }

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult> {
        ctx.check_cancelled()?;
        check_writable(ctx, &self.config.table)?;
        let count = ctx
            .source
            .delete(
                &ctx.token,
                &self.config.table,
                &self.filters,
                &WriteOptions::default(),
            )
            .await?;
        Ok(QueryResult::affected(count))
    }

    fn children(&self) -> &[Box<dyn Operator>] {
        &self.children
    }

    fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}
