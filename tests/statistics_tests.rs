use rowrun::{
    AutoRefreshCache, CancelToken, CardinalityEstimator, ColumnInfo, Filter, FilterOp,
    MemorySource, Row, SamplingCollector, StatisticsCache, TableInfo, Value,
};
use std::sync::Arc;
use std::time::Duration;

fn seeded_source() -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::new());
    let rows: Vec<Row> = (0..500)
        .map(|i| {
            Row::from([
                ("id", Value::Integer(i)),
                ("score", Value::Integer(10 + (i % 91))),
                ("status", Value::Integer(i % 4)),
                (
                    "note",
                    if i % 5 == 0 {
                        Value::Null
                    } else {
                        Value::Text(format!("n{}", i))
                    },
                ),
            ])
        })
        .collect();
    source.seed_table(
        TableInfo::new(
            "events",
            vec![
                ColumnInfo::new("id", "INTEGER").primary_key(),
                ColumnInfo::new("score", "INTEGER"),
                ColumnInfo::new("status", "INTEGER"),
                ColumnInfo::new("note", "TEXT"),
            ],
        ),
        rows,
    );
    source
}

#[tokio::test]
async fn test_collected_histograms_exclude_nulls_from_total() {
    let collector = SamplingCollector::new(seeded_source());
    let token = CancelToken::new();
    let stats = collector.collect(&token, "events", 1.0).await.unwrap();

    let note = &stats.histograms["note"];
    assert_eq!(note.null_count, 100);
    assert_eq!(note.total_count(), 400);
    assert_eq!(
        note.total_count(),
        note.buckets.iter().map(|b| b.count).sum::<i64>()
    );

    // Every collected histogram upholds the invariant.
    for histogram in stats.histograms.values() {
        assert_eq!(
            histogram.total_count(),
            histogram.buckets.iter().map(|b| b.count).sum::<i64>()
        );
    }
}

#[tokio::test]
async fn test_collected_column_statistics() -> anyhow::Result<()> {
    let collector = SamplingCollector::new(seeded_source());
    let token = CancelToken::new();
    let stats = collector.collect(&token, "events", 1.0).await?;

    assert_eq!(stats.row_count, 500);
    assert_eq!(stats.sample_count, 500);
    assert!((stats.sample_ratio - 1.0).abs() < 1e-9);

    let status = &stats.columns["status"];
    assert_eq!(status.distinct_count, 4);
    assert_eq!(status.min, Value::Integer(0));
    assert_eq!(status.max, Value::Integer(3));

    let score = &stats.columns["score"];
    assert_eq!(score.min, Value::Integer(10));
    assert_eq!(score.max, Value::Integer(100));
    Ok(())
}

#[tokio::test]
async fn test_cache_ttl_expiry_end_to_end() {
    let cache = StatisticsCache::new(Duration::from_millis(10));
    let collector = SamplingCollector::new(seeded_source());
    let token = CancelToken::new();

    let stats = collector.collect(&token, "events", 0.5).await.unwrap();
    cache.set("events", stats).unwrap();

    assert!(cache.get("events").unwrap().is_some());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cache.get("events").unwrap().is_none());

    let counters = cache.stats().unwrap();
    assert_eq!(counters.hits, 1);
    assert_eq!(counters.misses, 1);
    assert_eq!(counters.entries, 0);
}

#[tokio::test]
async fn test_estimator_over_collected_statistics() {
    let cache = Arc::new(StatisticsCache::new(Duration::from_secs(300)));
    let collector = SamplingCollector::new(seeded_source());
    let token = CancelToken::new();
    let stats = collector.collect(&token, "events", 1.0).await.unwrap();
    cache.set("events", stats).unwrap();

    let estimator = CardinalityEstimator::new(cache);
    assert_eq!(estimator.estimate_table_scan("events"), 500);

    // score spans 10..=100: a > 5 predicate keeps nearly everything, a
    // > 200 predicate nearly nothing.
    let below = estimator.filter_selectivity(
        "events",
        &Filter::condition("score", FilterOp::Gt, Value::Integer(5)),
    );
    let above = estimator.filter_selectivity(
        "events",
        &Filter::condition("score", FilterOp::Gt, Value::Integer(200)),
    );
    assert!(below >= 0.9);
    assert!(above <= 0.1);

    // status=1 OR status=2 composes by inclusion-exclusion.
    let or = Filter::or(vec![
        Filter::eq("status", Value::Integer(1)),
        Filter::eq("status", Value::Integer(2)),
    ]);
    let sel = estimator.filter_selectivity("events", &or);
    assert!(sel <= 0.46);
    assert!(sel < 0.5);

    let estimated = estimator.estimate_filter(
        "events",
        &[Filter::eq("status", Value::Integer(1))],
    );
    assert!(estimated >= 1);
    assert!(estimated < 500);
}

#[tokio::test]
async fn test_estimate_distinct_from_collected_ndv() {
    let cache = Arc::new(StatisticsCache::new(Duration::from_secs(300)));
    let collector = SamplingCollector::new(seeded_source());
    let token = CancelToken::new();
    let stats = collector.collect(&token, "events", 1.0).await.unwrap();
    cache.set("events", stats).unwrap();

    let estimator = CardinalityEstimator::new(cache);
    assert_eq!(
        estimator.estimate_distinct("events", &["status".into(), "id".into()]),
        4
    );
}

#[tokio::test]
async fn test_auto_refresh_get_and_invalidate() {
    let source = seeded_source();
    let cache = Arc::new(StatisticsCache::new(Duration::from_secs(60)));
    let refresh = AutoRefreshCache::new(
        Arc::clone(&cache),
        Arc::new(SamplingCollector::new(source)),
        0.5,
        Duration::from_millis(50),
    );
    let token = CancelToken::new();

    let first = refresh.get(&token, "events").await.unwrap();
    assert!(first.sample_count > 0);
    assert_eq!(cache.stats().unwrap().entries, 1);

    cache.invalidate("events").unwrap();
    let second = refresh.get(&token, "events").await.unwrap();
    assert_eq!(second.table, "events");
}

#[tokio::test]
async fn test_background_refresh_loop_stops_on_cancel() {
    let source = seeded_source();
    let cache = Arc::new(StatisticsCache::new(Duration::from_millis(30)));
    let refresh = Arc::new(AutoRefreshCache::new(
        Arc::clone(&cache),
        Arc::new(SamplingCollector::new(source)),
        0.2,
        Duration::from_millis(10),
    ));
    let token = CancelToken::new();
    refresh.refresh(&token, "events").await.unwrap();

    let handle = refresh.spawn(token.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();
    handle.await.unwrap();

    // Kept alive past several TTL windows by the loop.
    assert!(cache.get("events").unwrap().is_some());
}
