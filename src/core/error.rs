use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid plan config: {0}")]
    Config(String),

    #[error("{operator} operator failed")]
    Child {
        operator: &'static str,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Data source is not writable: {0}")]
    NotWritable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query cancelled")]
    Cancelled,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Wrap a child failure with the reporting operator's name.
    /// Cancellation passes through untouched so callers can match on it.
    pub fn with_operator(self, operator: &'static str) -> Self {
        match self {
            EngineError::Cancelled => EngineError::Cancelled,
            other => EngineError::Child {
                operator,
                source: Box::new(other),
            },
        }
    }

    /// Innermost error beneath any Child wrappers.
    pub fn root_cause(&self) -> &EngineError {
        match self {
            EngineError::Child { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), EngineError::Cancelled)
    }
}

impl<T> From<std::sync::PoisonError<T>> for EngineError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
