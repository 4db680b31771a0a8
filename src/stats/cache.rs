use super::TableStatistics;
use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters exposed by `StatisticsCache::stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

struct CachedStatistics {
    statistics: Arc<TableStatistics>,
    collect_time: Instant,
    last_accessed: Instant,
    hit_count: u64,
}

/// TTL-bounded map of table name to statistics snapshot. Snapshots handed
/// out are immutable; updates replace the entry atomically under the write
/// lock.
pub struct StatisticsCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedStatistics>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatisticsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a snapshot. An entry older than the TTL is removed on the way
    /// out and counts as a miss.
    pub fn get(&self, table: &str) -> Result<Option<Arc<TableStatistics>>> {
        let mut entries = self.entries.write()?;
        match entries.get_mut(table) {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Some(entry) if entry.collect_time.elapsed() > self.ttl => {
                log::debug!("statistics for '{}' expired, evicting", table);
                entries.remove(table);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Some(entry) => {
                entry.last_accessed = Instant::now();
                entry.hit_count += 1;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(Arc::clone(&entry.statistics)))
            }
        }
    }

    /// Insert or replace, restarting the entry's TTL clock.
    pub fn set(&self, table: impl Into<String>, statistics: TableStatistics) -> Result<Arc<TableStatistics>> {
        let statistics = Arc::new(statistics);
        let now = Instant::now();
        let mut entries = self.entries.write()?;
        entries.insert(
            table.into(),
            CachedStatistics {
                statistics: Arc::clone(&statistics),
                collect_time: now,
                last_accessed: now,
                hit_count: 0,
            },
        );
        Ok(statistics)
    }

    pub fn invalidate(&self, table: &str) -> Result<bool> {
        let mut entries = self.entries.write()?;
        Ok(entries.remove(table).is_some())
    }

    pub fn invalidate_all(&self) -> Result<()> {
        let mut entries = self.entries.write()?;
        entries.clear();
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let entries = self.entries.read()?;
        Ok(CacheStats {
            entries: entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        })
    }
}
