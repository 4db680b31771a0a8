use super::feedback::FeedbackChannel;
use crate::core::Result;
use crate::datasource::DataSource;
use crate::runtime::CancelToken;
use std::sync::Arc;

/// Per-query execution state threaded through the operator tree: the data
/// source, the cancellation token and the optimizer feedback channel.
#[derive(Clone)]
pub struct ExecutionContext {
    pub source: Arc<dyn DataSource>,
    pub token: CancelToken,
    pub feedback: FeedbackChannel,
}

impl ExecutionContext {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            token: CancelToken::new(),
            feedback: FeedbackChannel::new(),
        }
    }

    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackChannel) -> Self {
        self.feedback = feedback;
        self
    }

    /// Checked at every child boundary and after every blocking call.
    pub fn check_cancelled(&self) -> Result<()> {
        self.token.check()
    }
}
