use anyhow::Result;
use minirel::query::plan::{col, count_star, lit, JoinKind, SelectItem, Source};
use minirel::query::executor::operators::union_distinct;
use minirel::{DataValue, Database, ErrorKind, QueryError, QueryPlan, Row};

#[path = "../common/mod.rs"]
mod common;
use common::{fixture_db, ints, texts};

fn joined(kind: JoinKind) -> QueryPlan {
    QueryPlan::from(Source::aliased("customers", "c").join(
        Source::aliased("orders", "o"),
        kind,
        Some(col("c.id").eq(col("o.customer_id"))),
    ))
    .select(vec![
        SelectItem::expr(col("c.id")),
        SelectItem::expr(col("c.first_name")),
        SelectItem::expr(col("o.order_id")),
        SelectItem::expr(col("o.sales")),
    ])
}

fn run(db: &Database, kind: JoinKind) -> Result<minirel::QueryResultSet> {
    Ok(db.query(&joined(kind))?)
}

#[test]
fn test_inner_join() -> Result<()> {
    let db = fixture_db()?;
    let result = run(&db, JoinKind::Inner)?;
    assert_eq!(result.columns(), &["id", "first_name", "order_id", "sales"]);
    assert_eq!(result.row_count(), 3);
    assert_eq!(ints(&result, "order_id"), vec![Some(1001), Some(1002), Some(1003)]);
    assert_eq!(texts(&result, "first_name"), vec!["Maria", "John", "Georg"]);
    Ok(())
}

#[test]
fn test_left_join_keeps_every_customer() -> Result<()> {
    let db = fixture_db()?;
    let result = run(&db, JoinKind::Left)?;
    assert_eq!(result.row_count(), 5);
    assert_eq!(ints(&result, "id"), vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    assert_eq!(ints(&result, "order_id"), vec![Some(1001), Some(1002), Some(1003), None, None]);
    assert_eq!(ints(&result, "sales"), vec![Some(35), Some(15), Some(20), None, None]);
    Ok(())
}

#[test]
fn test_right_join_keeps_every_order() -> Result<()> {
    let db = fixture_db()?;
    let result = run(&db, JoinKind::Right)?;
    // Column order follows the plan, not the swapped execution
    assert_eq!(result.columns(), &["id", "first_name", "order_id", "sales"]);
    assert_eq!(ints(&result, "order_id"), vec![Some(1001), Some(1002), Some(1003), Some(1004)]);
    assert_eq!(ints(&result, "id"), vec![Some(1), Some(2), Some(3), None]);
    Ok(())
}

#[test]
fn test_full_join_is_union_of_left_and_right() -> Result<()> {
    let db = fixture_db()?;
    let result = run(&db, JoinKind::Full)?;
    assert_eq!(result.row_count(), 6);
    assert_eq!(ints(&result, "id"), vec![Some(1), Some(2), Some(3), Some(4), Some(5), None]);
    assert_eq!(ints(&result, "order_id"), vec![Some(1001), Some(1002), Some(1003), None, None, Some(1004)]);

    let left = run(&db, JoinKind::Left)?.into_rows();
    let right = run(&db, JoinKind::Right)?.into_rows();
    assert_eq!(union_distinct(left, right), result.into_rows());
    Ok(())
}

#[test]
fn test_anti_joins() -> Result<()> {
    let db = fixture_db()?;

    let result = run(&db, JoinKind::AntiLeft)?;
    assert_eq!(ints(&result, "id"), vec![Some(4), Some(5)]);
    assert_eq!(ints(&result, "order_id"), vec![None, None]);

    let result = run(&db, JoinKind::AntiRight)?;
    assert_eq!(ints(&result, "order_id"), vec![Some(1004)]);
    assert_eq!(ints(&result, "id"), vec![None]);

    // The same rows as a left join filtered on the missing side
    let filtered = db.query(&joined(JoinKind::Left).filter(col("o.order_id").is_null()))?;
    assert_eq!(ints(&filtered, "id"), vec![Some(4), Some(5)]);
    Ok(())
}

#[test]
fn test_cross_join() -> Result<()> {
    let db = fixture_db()?;
    let plan = QueryPlan::from(Source::table("customers").join(Source::table("orders"), JoinKind::Cross, None))
        .select_exprs(vec![col("first_name"), col("order_id")]);
    let result = db.query(&plan)?;
    assert_eq!(result.row_count(), 20);
    assert_eq!(ints(&result, "order_id")[..4], [Some(1001), Some(1002), Some(1003), Some(1004)]);

    let counted = db.query(
        &QueryPlan::from(Source::table("customers").join(Source::table("orders"), JoinKind::Cross, None))
            .select(vec![SelectItem::aliased(count_star(), "pairs")]),
    )?;
    assert_eq!(counted.value(0, "pairs"), Some(&DataValue::Integer(20)));
    Ok(())
}

#[test]
fn test_join_requires_condition() -> Result<()> {
    let db = fixture_db()?;
    let plan = QueryPlan::from(Source::table("customers").join(Source::table("orders"), JoinKind::Inner, None));
    let err = db.query(&plan).unwrap_err();
    assert!(matches!(err, QueryError::ValidationError(_)));
    Ok(())
}

#[test]
fn test_where_applies_after_join() -> Result<()> {
    let db = fixture_db()?;
    let result = db.query(&joined(JoinKind::Left).filter(col("c.country").eq(lit("Germany"))))?;
    assert_eq!(ints(&result, "id"), vec![Some(1), Some(4)]);
    assert_eq!(ints(&result, "order_id"), vec![Some(1001), None]);
    Ok(())
}

#[test]
fn test_nested_joins() -> Result<()> {
    let db = fixture_db()?;
    let source = Source::aliased("customers", "c")
        .join(Source::aliased("orders", "o"), JoinKind::Inner, Some(col("c.id").eq(col("o.customer_id"))))
        .join(
            Source::aliased("customers", "peer"),
            JoinKind::Inner,
            Some(col("peer.country").eq(col("c.country"))),
        );
    let result = db.query(
        &QueryPlan::from(source)
            .select_exprs(vec![col("o.order_id"), col("peer.first_name")])
            .order_by(col("o.order_id"), false)
            .order_by(col("peer.first_name"), false),
    )?;
    assert_eq!(ints(&result, "order_id"), vec![Some(1001), Some(1001), Some(1002), Some(1002), Some(1003)]);
    assert_eq!(texts(&result, "first_name"), vec!["Maria", "Martin", "John", "Peter", "Georg"]);
    Ok(())
}

#[test]
fn test_self_join_names() -> Result<()> {
    let db = fixture_db()?;
    let source = Source::table("customers").join(
        Source::aliased("customers", "other"),
        JoinKind::Inner,
        Some(col("customers.id").eq(col("other.id"))),
    );

    let result = db.query(&QueryPlan::from(source.clone()))?;
    assert_eq!(result.columns()[0], "customers.id");
    assert_eq!(result.columns()[4], "other.id");

    let err = db.query(&QueryPlan::from(source).select_exprs(vec![col("id")])).unwrap_err();
    assert!(matches!(err, QueryError::AmbiguousColumn(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    Ok(())
}

#[test]
fn test_self_join_without_alias_is_rejected() -> Result<()> {
    let db = fixture_db()?;
    let source = Source::table("customers").join(
        Source::table("customers"),
        JoinKind::Left,
        Some(col("customers.id").eq(col("customers.id").plus(lit(100)))),
    );

    let err = db
        .query(&QueryPlan::from(source).select_exprs(vec![col("customers.first_name")]))
        .unwrap_err();
    assert!(matches!(err, QueryError::ValidationError(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("duplicate table alias"));

    // The base table is untouched and still readable
    let names = texts(&db.query(&QueryPlan::from(Source::table("customers")))?, "first_name");
    assert_eq!(names.len(), 5);
    Ok(())
}

#[test]
fn test_union_distinct_keeps_first_seen_order() {
    let row = |v: i64| Row::from_values(vec!["x".to_string()], vec![DataValue::Integer(v)]);
    let merged = union_distinct(vec![row(3), row(1), row(3)], vec![row(2), row(1)]);
    assert_eq!(merged, vec![row(3), row(1), row(2)]);
}
