//! The operator kernel: the pull-based `Operator` contract and the builder
//! that turns a finalized plan tree into an operator tree.

pub mod aggregate;
pub mod context;
pub mod dml;
pub mod feedback;
pub mod join;
pub mod limit;
pub mod projection;
pub mod scan;
pub mod selection;
pub mod sort;
pub mod union;

pub use context::ExecutionContext;
pub use feedback::{FeedbackChannel, SelectionFeedback};

use crate::core::{ColumnInfo, EngineError, Result};
use crate::plan::{PlanConfig, PlanNode, PlanType};
use crate::result::QueryResult;
use async_trait::async_trait;

/// Pull-based physical operator. `execute` synchronously consumes the
/// children and returns a complete result; cancellation is observed at
/// every child boundary.
#[async_trait]
pub trait Operator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &ExecutionContext) -> Result<QueryResult>;

    fn children(&self) -> &[Box<dyn Operator>];

    fn schema(&self) -> &[ColumnInfo];
}

fn expect_children(plan_type: PlanType, got: usize, lo: usize, hi: Option<usize>) -> Result<()> {
    let ok = got >= lo && hi.is_none_or(|hi| got <= hi);
    if ok {
        return Ok(());
    }
    let want = match (lo, hi) {
        (lo, Some(hi)) if lo == hi => format!("exactly {}", lo),
        (lo, Some(hi)) => format!("{} to {}", lo, hi),
        (lo, None) => format!("at least {}", lo),
    };
    Err(EngineError::Config(format!(
        "{:?} expects {} children, got {}",
        plan_type, want, got
    )))
}

fn config_mismatch(node: &PlanNode) -> EngineError {
    log::debug!("rejecting plan node: config variant does not match {:?}", node.plan_type);
    EngineError::Config(format!(
        "config does not match plan type {:?}",
        node.plan_type
    ))
}

/// Recursively translate a plan node into an operator, validating child
/// arity and the config/type pairing on the way down.
pub fn build_operator(node: &PlanNode) -> Result<Box<dyn Operator>> {
    let children: Vec<Box<dyn Operator>> = node
        .children
        .iter()
        .map(build_operator)
        .collect::<Result<_>>()?;
    let arity = children.len();
    let schema = node.output_schema.clone();

    match &node.config {
        PlanConfig::TableScan(cfg) => {
            if node.plan_type != PlanType::TableScan {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 0, Some(0))?;
            Ok(Box::new(scan::TableScanOperator::new(cfg.clone(), schema)))
        }
        PlanConfig::Selection(cfg) => {
            if node.plan_type != PlanType::Selection {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 1, None)?;
            Ok(Box::new(selection::SelectionOperator::new(
                cfg.clone(),
                children,
                schema,
            )))
        }
        PlanConfig::Projection(cfg) => {
            if node.plan_type != PlanType::Projection {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 1, None)?;
            Ok(Box::new(projection::ProjectionOperator::new(
                cfg.clone(),
                children,
            )))
        }
        PlanConfig::Limit(cfg) => {
            if node.plan_type != PlanType::Limit {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 1, None)?;
            Ok(Box::new(limit::LimitOperator::new(*cfg, children, schema)))
        }
        PlanConfig::Sort(cfg) => {
            if node.plan_type != PlanType::Sort {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 1, None)?;
            Ok(Box::new(sort::SortOperator::new(cfg.clone(), children, schema)))
        }
        PlanConfig::Aggregate(cfg) => {
            if node.plan_type != PlanType::Aggregate {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 1, None)?;
            Ok(Box::new(aggregate::AggregateOperator::new(
                cfg.clone(),
                children,
            )))
        }
        PlanConfig::HashJoin(cfg) => {
            if node.plan_type != PlanType::HashJoin {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 2, Some(2))?;
            Ok(Box::new(join::HashJoinOperator::new(cfg.clone(), children)))
        }
        PlanConfig::Union(cfg) => {
            if node.plan_type != PlanType::Union {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 1, None)?;
            Ok(Box::new(union::UnionOperator::new(*cfg, children)))
        }
        PlanConfig::Insert(cfg) => {
            if node.plan_type != PlanType::Insert {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 0, Some(1))?;
            Ok(Box::new(dml::InsertOperator::new(cfg.clone(), children)))
        }
        PlanConfig::Update(cfg) => {
            if node.plan_type != PlanType::Update {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 0, Some(1))?;
            Ok(Box::new(dml::UpdateOperator::new(cfg.clone(), children)?))
        }
        PlanConfig::Delete(cfg) => {
            if node.plan_type != PlanType::Delete {
                return Err(config_mismatch(node));
            }
            expect_children(node.plan_type, arity, 0, Some(1))?;
            Ok(Box::new(dml::DeleteOperator::new(cfg.clone(), children)?))
        }
    }
}
