use anyhow::Result;
use minirel::catalog::{Column, DataType};
use minirel::query::plan::{
    avg, col, count, count_distinct, count_star, lit, max, min, null, sum, AggregateFunction, Expression, JoinKind,
    SelectItem, Source,
};
use minirel::{DataValue, Database, ErrorKind, QueryPlan, Statement};

#[path = "../common/mod.rs"]
mod common;
use common::{fixture_db, ints, texts};

fn per_country(items: Vec<SelectItem>) -> QueryPlan {
    QueryPlan::scan("customers").group_by(&["country"]).select(items)
}

#[test]
fn test_having_filters_groups() -> Result<()> {
    let db = fixture_db()?;
    let plan = per_country(vec![
        SelectItem::expr(col("country")),
        SelectItem::aliased(sum(col("score")), "total_score"),
    ])
    .having(sum(col("score")).gt(lit(800)));

    let result = db.query(&plan)?;
    assert_eq!(result.columns(), &["country", "total_score"]);
    assert_eq!(texts(&result, "country"), vec!["Germany", "USA"]);
    assert_eq!(ints(&result, "total_score"), vec![Some(850), Some(900)]);
    Ok(())
}

#[test]
fn test_aggregate_functions_per_group() -> Result<()> {
    let db = fixture_db()?;
    let plan = per_country(vec![
        SelectItem::expr(col("country")),
        SelectItem::expr(count_star()),
        SelectItem::expr(avg(col("score"))),
        SelectItem::expr(min(col("score"))),
        SelectItem::expr(max(col("score"))),
    ])
    .order_by(col("country"), false);

    let result = db.query(&plan)?;
    assert_eq!(result.columns(), &["country", "COUNT(*)", "AVG(score)", "MIN(score)", "MAX(score)"]);
    assert_eq!(texts(&result, "country"), vec!["Germany", "UK", "USA"]);
    assert_eq!(ints(&result, "COUNT(*)"), vec![Some(2), Some(1), Some(2)]);
    assert_eq!(
        result.column_values("AVG(score)"),
        vec![DataValue::Float(425.0), DataValue::Float(750.0), DataValue::Float(450.0)]
    );
    assert_eq!(ints(&result, "MIN(score)"), vec![Some(350), Some(750), Some(0)]);
    assert_eq!(ints(&result, "MAX(score)"), vec![Some(500), Some(750), Some(900)]);
    Ok(())
}

#[test]
fn test_groups_keep_first_seen_order() -> Result<()> {
    let db = fixture_db()?;
    let result = db.query(&per_country(vec![SelectItem::expr(col("country"))]))?;
    assert_eq!(texts(&result, "country"), vec!["Germany", "USA", "UK"]);
    Ok(())
}

#[test]
fn test_order_by_aggregate() -> Result<()> {
    let db = fixture_db()?;
    let plan = per_country(vec![SelectItem::expr(col("country"))]).order_by(sum(col("score")), true);
    let result = db.query(&plan)?;
    assert_eq!(texts(&result, "country"), vec!["USA", "Germany", "UK"]);
    Ok(())
}

#[test]
fn test_whole_table_aggregate() -> Result<()> {
    let db = fixture_db()?;
    let plan = QueryPlan::scan("customers").select(vec![
        SelectItem::aliased(count_star(), "customers"),
        SelectItem::aliased(sum(col("score")), "total"),
        SelectItem::aliased(count_distinct(col("country")), "countries"),
    ]);
    let result = db.query(&plan)?;
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.value(0, "customers"), Some(&DataValue::Integer(5)));
    assert_eq!(result.value(0, "total"), Some(&DataValue::Integer(2500)));
    assert_eq!(result.value(0, "countries"), Some(&DataValue::Integer(3)));
    Ok(())
}

#[test]
fn test_empty_input_without_group_by() -> Result<()> {
    let db = fixture_db()?;
    let plan = QueryPlan::scan("customers").filter(col("score").gt(lit(10_000))).select(vec![
        SelectItem::aliased(count_star(), "n"),
        SelectItem::aliased(sum(col("score")), "total"),
    ]);
    let result = db.query(&plan)?;
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.value(0, "n"), Some(&DataValue::Integer(0)));
    assert_eq!(result.value(0, "total"), Some(&DataValue::Null));

    // With GROUP BY there are simply no groups
    let grouped = per_country(vec![SelectItem::expr(col("country")), SelectItem::expr(count_star())])
        .filter(col("score").gt(lit(10_000)));
    assert_eq!(db.query(&grouped)?.row_count(), 0);
    Ok(())
}

#[test]
fn test_having_without_group_by() -> Result<()> {
    let db = fixture_db()?;
    let plan = QueryPlan::scan("customers")
        .select(vec![SelectItem::aliased(count_star(), "n")])
        .having(count_star().gt(lit(3)));
    assert_eq!(ints(&db.query(&plan)?, "n"), vec![Some(5)]);

    let plan = QueryPlan::scan("customers")
        .select(vec![SelectItem::aliased(count_star(), "n")])
        .having(count_star().gt(lit(10)));
    assert_eq!(db.query(&plan)?.row_count(), 0);
    Ok(())
}

#[test]
fn test_null_values_in_aggregates() -> Result<()> {
    let db = Database::default();
    db.execute(Statement::CreateTable {
        name: "readings".to_string(),
        columns: vec![Column::nullable("sensor", DataType::Text), Column::nullable("value", DataType::Integer)],
        primary_key: vec![],
    })?;
    db.execute(Statement::insert_values(
        "readings",
        vec![
            vec![lit("a"), lit(1)],
            vec![lit("a"), null()],
            vec![lit("b"), null()],
            vec![null(), lit(7)],
            vec![null(), lit(7)],
        ],
    ))?;

    let plan = QueryPlan::scan("readings").group_by(&["sensor"]).select(vec![
        SelectItem::expr(col("sensor")),
        SelectItem::aliased(count(col("value")), "n"),
        SelectItem::aliased(sum(col("value")), "total"),
        SelectItem::aliased(Expression::Aggregate {
            function: AggregateFunction::Sum,
            arg: Some(Box::new(col("value"))),
            distinct: true,
        }, "distinct_total"),
    ]);
    let result = db.query(&plan)?;
    // NULL keys form a single group of their own
    assert_eq!(result.column_values("sensor"), vec![DataValue::from("a"), DataValue::from("b"), DataValue::Null]);
    assert_eq!(ints(&result, "n"), vec![Some(1), Some(0), Some(2)]);
    assert_eq!(ints(&result, "total"), vec![Some(1), None, Some(14)]);
    assert_eq!(ints(&result, "distinct_total"), vec![Some(1), None, Some(7)]);
    Ok(())
}

#[test]
fn test_group_by_over_join() -> Result<()> {
    let db = fixture_db()?;
    let source = Source::aliased("customers", "c").join(
        Source::aliased("orders", "o"),
        JoinKind::Left,
        Some(col("c.id").eq(col("o.customer_id"))),
    );
    let plan = QueryPlan::from(source)
        .group_by(&["c.country"])
        .select(vec![
            SelectItem::expr(col("c.country")),
            SelectItem::aliased(count(col("o.order_id")), "orders"),
            SelectItem::aliased(sum(col("o.sales")), "sales"),
        ])
        .order_by(col("sales"), true);
    let result = db.query(&plan)?;
    assert_eq!(texts(&result, "country"), vec!["Germany", "UK", "USA"]);
    assert_eq!(ints(&result, "orders"), vec![Some(1), Some(1), Some(1)]);
    assert_eq!(ints(&result, "sales"), vec![Some(35), Some(20), Some(15)]);
    Ok(())
}

#[test]
fn test_aggregation_validation() -> Result<()> {
    let db = fixture_db()?;
    let kind = |plan: QueryPlan| db.query(&plan).unwrap_err().kind();

    // Column neither grouped nor aggregated
    assert_eq!(
        kind(per_country(vec![SelectItem::expr(col("first_name")), SelectItem::expr(count_star())])),
        ErrorKind::Validation
    );
    // Nested aggregate
    assert_eq!(kind(per_country(vec![SelectItem::expr(sum(max(col("score"))))])), ErrorKind::Validation);
    // SUM(*)
    let sum_star = Expression::Aggregate { function: AggregateFunction::Sum, arg: None, distinct: false };
    assert_eq!(kind(per_country(vec![SelectItem::expr(sum_star)])), ErrorKind::Validation);
    // Aggregate in WHERE
    assert_eq!(kind(QueryPlan::scan("customers").filter(count_star().gt(lit(1)))), ErrorKind::Validation);
    // Unknown grouping column
    assert_eq!(
        kind(QueryPlan::scan("customers").group_by(&["planet"]).select_exprs(vec![count_star()])),
        ErrorKind::NotFound
    );
    Ok(())
}
