use std::sync::{Arc, Mutex};

/// One Selection execution over a simple column predicate: how many rows
/// were examined and how many passed. The optimizer consumes the stream to
/// recalibrate its selectivity estimates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionFeedback {
    pub column: String,
    pub examined: u64,
    pub passed: u64,
}

/// Append-only feedback stream shared between operators and the optimizer.
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct FeedbackChannel {
    records: Arc<Mutex<Vec<SelectionFeedback>>>,
}

impl FeedbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, column: impl Into<String>, examined: u64, passed: u64) {
        if let Ok(mut records) = self.records.lock() {
            records.push(SelectionFeedback {
                column: column.into(),
                examined,
                passed,
            });
        }
    }

    /// Copy of the stream so far.
    pub fn snapshot(&self) -> Vec<SelectionFeedback> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Consume the stream, leaving it empty.
    pub fn drain(&self) -> Vec<SelectionFeedback> {
        self.records
            .lock()
            .map(|mut r| std::mem::take(&mut *r))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_drain() {
        let channel = FeedbackChannel::new();
        channel.record("age", 100, 40);
        channel.record("age", 50, 10);

        assert_eq!(channel.snapshot().len(), 2);

        let drained = channel.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].examined, 100);
        assert_eq!(drained[0].passed, 40);
        assert!(channel.snapshot().is_empty());
    }

    #[test]
    fn test_clones_share_stream() {
        let channel = FeedbackChannel::new();
        let clone = channel.clone();
        clone.record("x", 1, 1);
        assert_eq!(channel.snapshot().len(), 1);
    }
}
