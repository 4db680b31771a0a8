use rowrun::{
    CancelToken, ColumnInfo, DataSource, DeleteConfig, Engine, Expr, InsertConfig, MemorySource,
    PlanConfig, PlanNode, PlanType, QueryOptions, Row, TableInfo, TableScanConfig, UnionConfig,
    UpdateConfig, Value,
};
use std::sync::Arc;

fn scan(table: &str) -> PlanNode {
    PlanNode::new(
        PlanType::TableScan,
        PlanConfig::TableScan(TableScanConfig {
            table: table.into(),
            ..Default::default()
        }),
    )
}

fn numbers(table: &str, values: &[i64]) -> (String, Vec<Row>) {
    (
        table.to_string(),
        values
            .iter()
            .map(|v| Row::from([("n", Value::Integer(*v))]))
            .collect(),
    )
}

fn union_engine() -> Engine {
    let source = Arc::new(MemorySource::new());
    for (table, rows) in [numbers("a", &[1, 2, 3]), numbers("b", &[3, 4])] {
        source.seed_table(TableInfo::new(table, vec![ColumnInfo::new("n", "INTEGER")]), rows);
    }
    Engine::new(source)
}

#[tokio::test]
async fn test_union_all_concatenates() {
    let engine = union_engine();
    let plan = PlanNode::new(
        PlanType::Union,
        PlanConfig::Union(UnionConfig { distinct: false }),
    )
    .with_children(vec![scan("a"), scan("b")]);
    let result = engine.execute_plan(&plan).await.unwrap();
    assert_eq!(result.row_count(), 5);
    assert_eq!(result.total, 5);
    assert_eq!(result.columns.len(), 1);
}

#[tokio::test]
async fn test_union_distinct_dedups() {
    let engine = union_engine();
    let plan = PlanNode::new(
        PlanType::Union,
        PlanConfig::Union(UnionConfig { distinct: true }),
    )
    .with_children(vec![scan("a"), scan("b")]);
    let result = engine.execute_plan(&plan).await.unwrap();
    assert_eq!(result.row_count(), 4);

    let mut values: Vec<i64> = result
        .iter()
        .map(|r| r.get("n").and_then(Value::as_i64).unwrap())
        .collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_union_distinct_keeps_type_distinct_values() {
    let source = Arc::new(MemorySource::new());
    source.seed_table(
        TableInfo::new("mixed", vec![ColumnInfo::new("v", "TEXT")]),
        vec![
            Row::from([("v", Value::Integer(1))]),
            Row::from([("v", Value::Text("1".into()))]),
        ],
    );
    let engine = Engine::new(source);
    let plan = PlanNode::new(
        PlanType::Union,
        PlanConfig::Union(UnionConfig { distinct: true }),
    )
    .with_children(vec![scan("mixed")]);
    let result = engine.execute_plan(&plan).await.unwrap();
    // Integer 1 and string "1" are different rows.
    assert_eq!(result.row_count(), 2);
}

fn people_source() -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::new());
    source.seed_table(
        TableInfo::new(
            "people",
            vec![
                ColumnInfo::new("id", "INTEGER").primary_key(),
                ColumnInfo::new("name", "TEXT"),
                ColumnInfo::new("age", "INTEGER"),
            ],
        ),
        vec![
            Row::from([
                ("id", Value::Integer(1)),
                ("name", Value::Text("Ann".into())),
                ("age", Value::Integer(41)),
            ]),
            Row::from([
                ("id", Value::Integer(2)),
                ("name", Value::Text("Ben".into())),
                ("age", Value::Integer(17)),
            ]),
            Row::from([
                ("id", Value::Integer(3)),
                ("name", Value::Text("Cal".into())),
                ("age", Value::Integer(64)),
            ]),
        ],
    );
    source
}

#[tokio::test]
async fn test_insert_reports_affected_count() {
    let source = people_source();
    let engine = Engine::new(source.clone());
    let plan = PlanNode::new(
        PlanType::Insert,
        PlanConfig::Insert(InsertConfig {
            table: "people".into(),
            rows: vec![Row::from([
                ("id", Value::Integer(4)),
                ("name", Value::Text("Dee".into())),
                ("age", Value::Integer(30)),
            ])],
        }),
    );
    let result = engine.execute_plan(&plan).await.unwrap();
    assert_eq!(result.total, 1);
    assert!(result.rows.is_empty());

    let token = CancelToken::new();
    let info = source.get_table_info(&token, "people").await.unwrap();
    assert_eq!(info.row_count, 4);
}

#[tokio::test]
async fn test_update_translates_where_expression() {
    let source = people_source();
    let engine = Engine::new(source.clone());
    // WHERE age >= 18 AND name LIKE '%n'
    let filter = Expr::binary(
        Expr::binary(Expr::column("age"), ">=", Expr::literal(18)),
        "and",
        Expr::binary(Expr::column("name"), "like", Expr::literal("%n")),
    );
    let plan = PlanNode::new(
        PlanType::Update,
        PlanConfig::Update(UpdateConfig {
            table: "people".into(),
            updates: Row::from([("age", Value::Integer(42))]),
            filter: Some(filter),
        }),
    );
    let result = engine.execute_plan(&plan).await.unwrap();
    assert_eq!(result.total, 1);

    let token = CancelToken::new();
    let rows = source
        .query(&token, "people", &QueryOptions::all())
        .await
        .unwrap();
    let ann = rows
        .iter()
        .find(|r| r.get("name") == Some(&Value::Text("Ann".into())))
        .unwrap();
    assert_eq!(ann.get("age"), Some(&Value::Integer(42)));
}

#[tokio::test]
async fn test_delete_uses_translated_filter_not_id_stub() {
    let source = people_source();
    let engine = Engine::new(source.clone());
    // Deleting by a non-id predicate must remove exactly the matching row.
    let plan = PlanNode::new(
        PlanType::Delete,
        PlanConfig::Delete(DeleteConfig {
            table: "people".into(),
            filter: Some(Expr::binary(Expr::column("age"), "<", Expr::literal(18))),
        }),
    );
    let result = engine.execute_plan(&plan).await.unwrap();
    assert_eq!(result.total, 1);

    let token = CancelToken::new();
    let rows = source
        .query(&token, "people", &QueryOptions::all())
        .await
        .unwrap();
    assert_eq!(rows.row_count(), 2);
    assert!(rows.iter().all(|r| r.get("name") != Some(&Value::Text("Ben".into()))));
}

#[tokio::test]
async fn test_delete_without_filter_clears_table() {
    let source = people_source();
    let engine = Engine::new(source.clone());
    let plan = PlanNode::new(
        PlanType::Delete,
        PlanConfig::Delete(DeleteConfig {
            table: "people".into(),
            filter: None,
        }),
    );
    let result = engine.execute_plan(&plan).await.unwrap();
    assert_eq!(result.total, 3);
}

#[tokio::test]
async fn test_dml_against_read_only_source_fails() {
    let source = Arc::new(MemorySource::read_only());
    source.seed_table(
        TableInfo::new("people", vec![ColumnInfo::new("id", "INTEGER")]),
        vec![Row::from([("id", Value::Integer(1))])],
    );
    let engine = Engine::new(source);

    let insert = PlanNode::new(
        PlanType::Insert,
        PlanConfig::Insert(InsertConfig {
            table: "people".into(),
            rows: vec![Row::from([("id", Value::Integer(2))])],
        }),
    );
    assert!(matches!(
        engine.execute_plan(&insert).await.unwrap_err(),
        rowrun::EngineError::NotWritable(_)
    ));

    let delete = PlanNode::new(
        PlanType::Delete,
        PlanConfig::Delete(DeleteConfig {
            table: "people".into(),
            filter: None,
        }),
    );
    assert!(matches!(
        engine.execute_plan(&delete).await.unwrap_err(),
        rowrun::EngineError::NotWritable(_)
    ));
}

#[tokio::test]
async fn test_update_with_in_filter() {
    let source = people_source();
    let engine = Engine::new(source.clone());
    let filter = Expr::in_list(
        Expr::column("id"),
        vec![Expr::literal(1), Expr::literal(3)],
    );
    let plan = PlanNode::new(
        PlanType::Update,
        PlanConfig::Update(UpdateConfig {
            table: "people".into(),
            updates: Row::from([("age", Value::Integer(0))]),
            filter: Some(filter),
        }),
    );
    let result = engine.execute_plan(&plan).await.unwrap();
    assert_eq!(result.total, 2);
}
