use super::{SamplingCollector, StatisticsCache, TableStatistics};
use crate::core::Result;
use crate::runtime::CancelToken;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cache wrapper that collects on miss and keeps entries fresh from a
/// background loop. Tables become known to the loop once they have been
/// refreshed or preloaded at least once.
pub struct AutoRefreshCache {
    cache: Arc<StatisticsCache>,
    collector: Arc<SamplingCollector>,
    sample_rate: f64,
    interval: Duration,
    next_refresh: Mutex<HashMap<String, Instant>>,
}

impl AutoRefreshCache {
    pub fn new(
        cache: Arc<StatisticsCache>,
        collector: Arc<SamplingCollector>,
        sample_rate: f64,
        interval: Duration,
    ) -> Self {
        Self {
            cache,
            collector,
            sample_rate,
            interval,
            next_refresh: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<StatisticsCache> {
        &self.cache
    }

    /// Cached snapshot if fresh, otherwise collect-and-cache.
    pub async fn get(&self, token: &CancelToken, table: &str) -> Result<Arc<TableStatistics>> {
        if let Some(stats) = self.cache.get(table)? {
            return Ok(stats);
        }
        self.refresh(token, table).await
    }

    /// Collect, cache and push the table's next refresh deadline out by one
    /// TTL.
    pub async fn refresh(&self, token: &CancelToken, table: &str) -> Result<Arc<TableStatistics>> {
        let statistics = self.collector.collect(token, table, self.sample_rate).await?;
        let snapshot = self.cache.set(table, statistics)?;
        let mut next = self.next_refresh.lock()?;
        next.insert(table.to_string(), Instant::now() + self.cache.ttl());
        Ok(snapshot)
    }

    /// Refresh many tables in parallel. Individual failures are logged and
    /// skipped so one bad table cannot starve the rest.
    pub async fn preload(&self, token: &CancelToken, tables: &[String]) -> Result<()> {
        let refreshes = tables.iter().map(|table| async move {
            (table.clone(), self.refresh(token, table).await)
        });
        for (table, outcome) in join_all(refreshes).await {
            if let Err(err) = outcome {
                log::warn!("preload of '{}' failed: {}", table, err);
            }
        }
        Ok(())
    }

    fn due_tables(&self) -> Vec<String> {
        let Ok(next) = self.next_refresh.lock() else {
            return Vec::new();
        };
        let now = Instant::now();
        next.iter()
            .filter(|(_, at)| **at <= now)
            .map(|(table, _)| table.clone())
            .collect()
    }

    /// Background loop: tick every `interval`, refresh whatever is due,
    /// stop when the token is cancelled.
    pub async fn run(self: Arc<Self>, token: CancelToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    for table in self.due_tables() {
                        if token.is_cancelled() {
                            return;
                        }
                        if let Err(err) = self.refresh(&token, &table).await {
                            log::warn!("auto-refresh of '{}' failed: {}", table, err);
                        }
                    }
                }
            }
        }
    }

    /// Spawn the background loop on the current runtime.
    pub fn spawn(self: &Arc<Self>, token: CancelToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(token))
    }
}
