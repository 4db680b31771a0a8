use crate::core::Result;
use crate::datasource::DataSource;
use crate::executor::{ExecutionContext, FeedbackChannel, build_operator};
use crate::plan::PlanNode;
use crate::result::QueryResult;
use crate::runtime::{CancelToken, QueryRegistry, QueryStatus};
use std::sync::Arc;

/// Engine handle tying a data source, the query registry and the optimizer
/// feedback channel together. One engine serves many concurrent queries;
/// each `execute_plan` call drives its own operator tree.
pub struct Engine {
    source: Arc<dyn DataSource>,
    registry: Arc<QueryRegistry>,
    feedback: FeedbackChannel,
}

impl Engine {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            registry: Arc::new(QueryRegistry::new()),
            feedback: FeedbackChannel::new(),
        }
    }

    pub fn registry(&self) -> &Arc<QueryRegistry> {
        &self.registry
    }

    pub fn feedback(&self) -> &FeedbackChannel {
        &self.feedback
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// Execute a finalized plan under a generated query id.
    pub async fn execute_plan(&self, plan: &PlanNode) -> Result<QueryResult> {
        let query_id = QueryRegistry::generate_query_id();
        self.execute_plan_as(&query_id, plan).await
    }

    /// Execute a finalized plan under the caller's query id. The query
    /// stays in the registry after completion so its terminal status can be
    /// inspected; unregister it through the registry when done.
    pub async fn execute_plan_as(&self, query_id: &str, plan: &PlanNode) -> Result<QueryResult> {
        let token = CancelToken::new();
        self.registry.register_query(query_id, token.clone())?;

        let operator = match build_operator(plan) {
            Ok(operator) => operator,
            Err(err) => {
                let _ = self
                    .registry
                    .update_progress(query_id, 0.0, QueryStatus::Error);
                return Err(err);
            }
        };

        let ctx = ExecutionContext::new(Arc::clone(&self.source))
            .with_token(token)
            .with_feedback(self.feedback.clone());
        let outcome = operator.execute(&ctx).await;

        let status = match &outcome {
            Ok(_) => QueryStatus::Done,
            Err(err) if err.is_cancelled() => QueryStatus::Cancelled,
            Err(_) => QueryStatus::Error,
        };
        let progress = if outcome.is_ok() { 1.0 } else { 0.0 };
        // Best effort; the caller may already have unregistered the query.
        let _ = self.registry.update_progress(query_id, progress, status);

        outcome
    }
}
