//! Process-wide registry of active queries and the cooperative cancellation
//! primitive threaded through every operator and data-source call.

use crate::core::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

/// Shared cancellation handle. Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Error when cancellation has been observed; checked at every child
    /// boundary and after blocking calls.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Running,
    Done,
    Cancelled,
    Error,
}

/// Deep-copy snapshot handed to callers; mutating it cannot affect the
/// registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySnapshot {
    pub query_id: String,
    pub start_time: DateTime<Utc>,
    pub status: QueryStatus,
    pub progress: f64,
}

struct TrackedQuery {
    start_time: DateTime<Utc>,
    status: QueryStatus,
    progress: f64,
    cancel: CancelToken,
}

impl TrackedQuery {
    fn snapshot(&self, id: &str) -> QuerySnapshot {
        QuerySnapshot {
            query_id: id.to_string(),
            start_time: self.start_time,
            status: self.status,
            progress: self.progress,
        }
    }
}

/// Registry of active queries, guarded by a reader-writer lock.
#[derive(Default)]
pub struct QueryRegistry {
    queries: RwLock<HashMap<String, TrackedQuery>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_query_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn register_query(&self, id: impl Into<String>, cancel: CancelToken) -> Result<()> {
        let id = id.into();
        let mut queries = self.queries.write()?;
        queries.insert(
            id,
            TrackedQuery {
                start_time: Utc::now(),
                status: QueryStatus::Running,
                progress: 0.0,
                cancel,
            },
        );
        Ok(())
    }

    pub fn update_progress(&self, id: &str, progress: f64, status: QueryStatus) -> Result<()> {
        let mut queries = self.queries.write()?;
        let tracked = queries
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("query '{}'", id)))?;
        tracked.progress = progress.clamp(0.0, 1.0);
        tracked.status = status;
        Ok(())
    }

    /// Fire the registered cancel handle and mark the query cancelled.
    pub fn cancel_query(&self, id: &str) -> Result<()> {
        let mut queries = self.queries.write()?;
        let tracked = queries
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("query '{}'", id)))?;
        tracked.cancel.cancel();
        tracked.status = QueryStatus::Cancelled;
        Ok(())
    }

    pub fn get_query_status(&self, id: &str) -> Result<QuerySnapshot> {
        let queries = self.queries.read()?;
        queries
            .get(id)
            .map(|t| t.snapshot(id))
            .ok_or_else(|| EngineError::NotFound(format!("query '{}'", id)))
    }

    pub fn get_all_queries(&self) -> Result<Vec<QuerySnapshot>> {
        let queries = self.queries.read()?;
        Ok(queries.iter().map(|(id, t)| t.snapshot(id)).collect())
    }

    pub fn unregister_query(&self, id: &str) -> Result<()> {
        let mut queries = self.queries.write()?;
        queries.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_snapshot() {
        let registry = QueryRegistry::new();
        registry.register_query("q1", CancelToken::new()).unwrap();

        let snap = registry.get_query_status("q1").unwrap();
        assert_eq!(snap.status, QueryStatus::Running);
        assert_eq!(snap.progress, 0.0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let registry = QueryRegistry::new();
        registry.register_query("q1", CancelToken::new()).unwrap();

        let mut snap = registry.get_query_status("q1").unwrap();
        snap.progress = 0.9;
        snap.status = QueryStatus::Error;

        let fresh = registry.get_query_status("q1").unwrap();
        assert_eq!(fresh.progress, 0.0);
        assert_eq!(fresh.status, QueryStatus::Running);
    }

    #[test]
    fn test_progress_clamped() {
        let registry = QueryRegistry::new();
        registry.register_query("q1", CancelToken::new()).unwrap();
        registry.update_progress("q1", 7.5, QueryStatus::Running).unwrap();
        assert_eq!(registry.get_query_status("q1").unwrap().progress, 1.0);
    }

    #[test]
    fn test_cancel_fires_token() {
        let registry = QueryRegistry::new();
        let token = CancelToken::new();
        registry.register_query("q1", token.clone()).unwrap();

        registry.cancel_query("q1").unwrap();
        assert!(token.is_cancelled());
        assert!(token.check().is_err());
        assert_eq!(
            registry.get_query_status("q1").unwrap().status,
            QueryStatus::Cancelled
        );
    }

    #[test]
    fn test_missing_query_is_not_found() {
        let registry = QueryRegistry::new();
        assert!(matches!(
            registry.get_query_status("ghost"),
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
    }
}
