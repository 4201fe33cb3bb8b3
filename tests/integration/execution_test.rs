use anyhow::Result;
use minirel::query::plan::{col, count_star, lit, null, Assignment, InsertSource, JoinKind, Limit, SelectItem, Source};
use minirel::{DataValue, EngineConfig, ErrorKind, QueryError, QueryPlan, Statement};

#[path = "../common/mod.rs"]
mod common;
use common::{fixture_db, fixture_db_with, ints, texts};

#[test]
fn test_select_star_preserves_insertion_order() -> Result<()> {
    let db = fixture_db()?;
    let result = db.query(&QueryPlan::scan("customers"))?;
    assert_eq!(result.columns(), &["id", "first_name", "country", "score"]);
    assert_eq!(ints(&result, "id"), vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    Ok(())
}

#[test]
fn test_distinct_is_idempotent() -> Result<()> {
    let db = fixture_db()?;
    let plan = QueryPlan::scan("customers").select_exprs(vec![col("country")]).distinct();
    let once = db.query(&plan)?;
    assert_eq!(texts(&once, "country"), vec!["Germany", "USA", "UK"]);

    // Feed the distinct rows back in and apply DISTINCT again
    db.execute(Statement::CreateTable {
        name: "countries".to_string(),
        columns: vec![minirel::Column::nullable("country", minirel::DataType::Text)],
        primary_key: vec![],
    })?;
    db.execute(Statement::Insert {
        table: "countries".to_string(),
        columns: None,
        source: InsertSource::Query(Box::new(plan)),
    })?;
    let twice = db.query(&QueryPlan::scan("countries").distinct())?;
    assert_eq!(twice.rows(), once.rows());
    Ok(())
}

#[test]
fn test_limit_bounds() -> Result<()> {
    let db = fixture_db()?;
    let all = db.query(&QueryPlan::scan("customers").order_by(col("score"), true))?;

    let none = db.query(&QueryPlan::scan("customers").order_by(col("score"), true).limit(0))?;
    assert_eq!(none.row_count(), 0);
    assert_eq!(none.columns(), all.columns());

    for n in [5, 6, 100] {
        let limited = db.query(&QueryPlan::scan("customers").order_by(col("score"), true).limit(n))?;
        assert_eq!(limited.rows(), all.rows());
    }

    let paged = db.query(&QueryPlan::scan("customers").order_by(col("score"), true).limit(2).offset(1))?;
    assert_eq!(texts(&paged, "first_name"), vec!["Georg", "Martin"]);

    let past_end = db.query(&QueryPlan::scan("customers").offset(10))?;
    assert_eq!(past_end.row_count(), 0);
    Ok(())
}

#[test]
fn test_negative_limit_rejected() -> Result<()> {
    let db = fixture_db()?;
    let mut plan = QueryPlan::scan("customers");
    plan.limit = Some(Limit { count: -1, offset: 0 });
    assert!(matches!(db.query(&plan), Err(QueryError::InvalidLimit(_))));

    plan.limit = Some(Limit { count: 1, offset: -1 });
    assert_eq!(db.query(&plan).unwrap_err().kind(), ErrorKind::Validation);
    Ok(())
}

#[test]
fn test_order_by_multiple_keys_is_stable() -> Result<()> {
    let db = fixture_db()?;
    let result = db.query(
        &QueryPlan::scan("customers")
            .order_by(col("country"), false)
            .order_by(col("score"), true),
    )?;
    assert_eq!(texts(&result, "first_name"), vec!["Martin", "Maria", "Georg", "John", "Peter"]);

    // Ties keep input order
    let result = db.query(&QueryPlan::scan("customers").order_by(col("country"), false))?;
    assert_eq!(texts(&result, "first_name"), vec!["Maria", "Martin", "Georg", "John", "Peter"]);
    Ok(())
}

#[test]
fn test_null_ordering_follows_config() -> Result<()> {
    for (nulls_first, expected) in [(true, vec![None, Some(0), Some(350)]), (false, vec![Some(0), Some(350), Some(500)])] {
        let db = fixture_db_with(EngineConfig::default().with_nulls_first(nulls_first))?;
        db.execute(Statement::insert_values("customers", vec![vec![lit(6), lit("Anna"), lit("USA"), null()]]))?;

        let asc = db.query(&QueryPlan::scan("customers").order_by(col("score"), false).limit(3))?;
        assert_eq!(ints(&asc, "score"), expected);

        // Descending mirrors the placement
        let desc = db.query(&QueryPlan::scan("customers").order_by(col("score"), true))?;
        let last = ints(&desc, "score").last().copied().flatten();
        assert_eq!(last.is_none(), nulls_first);
    }
    Ok(())
}

#[test]
fn test_stage_order() -> Result<()> {
    let db = fixture_db()?;
    // WHERE before grouping, HAVING on groups, ORDER BY on an alias, LIMIT last
    let plan = QueryPlan::scan("customers")
        .filter(col("score").gt(lit(0)))
        .group_by(&["country"])
        .select(vec![
            SelectItem::expr(col("country")),
            SelectItem::aliased(count_star(), "n"),
        ])
        .having(count_star().gt_eq(lit(1)))
        .order_by(col("n"), true)
        .limit(1);
    let result = db.query(&plan)?;
    assert_eq!(texts(&result, "country"), vec!["Germany"]);
    assert_eq!(ints(&result, "n"), vec![Some(2)]);

    // DISTINCT runs on projected values before LIMIT
    let plan = QueryPlan::scan("customers")
        .select_exprs(vec![col("country")])
        .distinct()
        .order_by(col("country"), false)
        .limit(2);
    assert_eq!(texts(&db.query(&plan)?, "country"), vec!["Germany", "UK"]);
    Ok(())
}

#[test]
fn test_qualified_wildcard() -> Result<()> {
    let db = fixture_db()?;
    let source = Source::aliased("customers", "c").join(
        Source::aliased("orders", "o"),
        JoinKind::Inner,
        Some(col("c.id").eq(col("o.customer_id"))),
    );
    let result = db.query(&QueryPlan::from(source.clone()).select(vec![SelectItem::QualifiedWildcard("o".to_string())]))?;
    assert_eq!(result.columns(), &["order_id", "customer_id", "order_date", "sales"]);
    assert_eq!(result.value(0, "order_date"), Some(&DataValue::date("2021-01-11")?));

    let err = db
        .query(&QueryPlan::from(source).select(vec![SelectItem::QualifiedWildcard("x".to_string())]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

#[test]
fn test_update_uses_pre_update_values() -> Result<()> {
    let db = fixture_db()?;
    let result = db.execute(Statement::Update {
        table: "customers".to_string(),
        assignments: vec![
            Assignment::new("score", col("score").plus(lit(100))),
            Assignment::new("first_name", col("country")),
            Assignment::new("country", col("first_name")),
        ],
        predicate: Some(col("country").eq(lit("Germany"))),
    })?;
    assert_eq!(result.value(0, "rows_affected"), Some(&DataValue::Integer(2)));

    let rows = db.query(&QueryPlan::scan("customers").filter(col("id").in_list(vec![lit(1), lit(4)])))?;
    assert_eq!(ints(&rows, "score"), vec![Some(450), Some(600)]);
    assert_eq!(texts(&rows, "first_name"), vec!["Germany", "Germany"]);
    assert_eq!(texts(&rows, "country"), vec!["Maria", "Martin"]);
    Ok(())
}

#[test]
fn test_failed_update_changes_nothing() -> Result<()> {
    let db = fixture_db()?;
    let err = db
        .execute(Statement::Update {
            table: "customers".to_string(),
            assignments: vec![Assignment::new("score", lit(1000).divide(col("score")))],
            predicate: None,
        })
        .unwrap_err();
    assert!(matches!(err, QueryError::DivisionByZero));
    let scores = db.query(&QueryPlan::scan("customers"))?;
    assert_eq!(ints(&scores, "score"), vec![Some(350), Some(900), Some(750), Some(500), Some(0)]);
    Ok(())
}

#[test]
fn test_delete() -> Result<()> {
    let db = fixture_db()?;
    let result = db.execute(Statement::Delete {
        table: "customers".to_string(),
        predicate: Some(col("score").lt(lit(400))),
    })?;
    assert_eq!(result.value(0, "rows_affected"), Some(&DataValue::Integer(2)));
    assert_eq!(ints(&db.query(&QueryPlan::scan("customers"))?, "id"), vec![Some(2), Some(3), Some(4)]);

    let result = db.execute(Statement::Delete { table: "orders".to_string(), predicate: None })?;
    assert_eq!(result.value(0, "rows_affected"), Some(&DataValue::Integer(4)));
    assert_eq!(db.query(&QueryPlan::scan("orders"))?.row_count(), 0);
    Ok(())
}

#[test]
fn test_max_result_rows_truncates() -> Result<()> {
    let db = fixture_db_with(EngineConfig::default().with_max_result_rows(Some(2)))?;
    let result = db.query(&QueryPlan::scan("customers"))?;
    assert_eq!(ints(&result, "id"), vec![Some(1), Some(2)]);
    Ok(())
}

#[test]
fn test_unknown_names() -> Result<()> {
    let db = fixture_db()?;
    assert_eq!(db.query(&QueryPlan::scan("suppliers")).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        db.query(&QueryPlan::scan("customers").select_exprs(vec![col("email")])).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        db.query(&QueryPlan::scan("customers").filter(col("email").is_null())).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    Ok(())
}

#[test]
fn test_statements_round_trip_through_json() -> Result<()> {
    let statements = minirel::demo::setup_statements();
    let json = serde_json::to_string(&statements)?;
    let parsed: Vec<Statement> = serde_json::from_str(&json)?;
    assert_eq!(parsed, statements);

    let db = minirel::Database::default();
    db.execute_all(parsed)?;
    assert_eq!(db.query(&QueryPlan::scan("orders"))?.row_count(), 4);
    Ok(())
}
