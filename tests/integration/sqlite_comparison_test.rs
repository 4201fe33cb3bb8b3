// Differential tests: the same queries against minirel and SQLite over the
// customers/orders fixture must produce the same rows.

use anyhow::Result;
use minirel::query::plan::{avg, col, count_star, lit, null, sum, JoinKind, SelectItem, Source};
use minirel::{Database, EngineConfig, QueryPlan, QueryResultSet, Statement};
use rusqlite::types::Value;
use rusqlite::Connection;

#[path = "../common/mod.rs"]
mod common;
use common::{fixture_db, fixture_db_with};

const SQLITE_FIXTURE: &str = "
    CREATE TABLE customers (id INTEGER PRIMARY KEY, first_name VARCHAR(50) NOT NULL, country VARCHAR(50), score INTEGER);
    INSERT INTO customers VALUES (1, 'Maria', 'Germany', 350), (2, 'John', 'USA', 900), (3, 'Georg', 'UK', 750),
                                 (4, 'Martin', 'Germany', 500), (5, 'Peter', 'USA', 0);
    CREATE TABLE orders (order_id INTEGER PRIMARY KEY, customer_id INTEGER NOT NULL, order_date DATE, sales INTEGER);
    INSERT INTO orders VALUES (1001, 1, '2021-01-11', 35), (1002, 2, '2021-04-05', 15),
                              (1003, 3, '2021-06-18', 20), (1004, 6, '2021-08-31', 10);
";

fn sqlite_fixture() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SQLITE_FIXTURE)?;
    Ok(conn)
}

fn render(value: Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => format!("{:?}", b),
    }
}

fn sqlite_rows(conn: &Connection, sql: &str) -> Result<Vec<Vec<String>>> {
    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();
    let rows = stmt.query_map([], |row| {
        (0..width)
            .map(|i| row.get::<_, Value>(i).map(render))
            .collect::<rusqlite::Result<Vec<_>>>()
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn engine_rows(result: &QueryResultSet) -> Vec<Vec<String>> {
    result
        .rows()
        .iter()
        .map(|row| row.values().map(|v| v.to_string()).collect())
        .collect()
}

fn assert_same(db: &Database, plan: &QueryPlan, conn: &Connection, sql: &str) -> Result<()> {
    let ours = engine_rows(&db.query(plan)?);
    let theirs = sqlite_rows(conn, sql)?;
    assert_eq!(ours, theirs, "mismatch for {}", sql);
    Ok(())
}

fn assert_same_unordered(db: &Database, plan: &QueryPlan, conn: &Connection, sql: &str) -> Result<()> {
    let mut ours = engine_rows(&db.query(plan)?);
    let mut theirs = sqlite_rows(conn, sql)?;
    ours.sort();
    theirs.sort();
    assert_eq!(ours, theirs, "mismatch for {}", sql);
    Ok(())
}

fn customer_orders(kind: JoinKind) -> QueryPlan {
    QueryPlan::from(Source::aliased("customers", "c").join(
        Source::aliased("orders", "o"),
        kind,
        Some(col("c.id").eq(col("o.customer_id"))),
    ))
    .select_exprs(vec![col("c.id"), col("c.first_name"), col("o.order_id"), col("o.sales")])
}

#[test]
fn test_joins_match_sqlite() -> Result<()> {
    let db = fixture_db()?;
    let conn = sqlite_fixture()?;
    let select = "SELECT c.id, c.first_name, o.order_id, o.sales FROM customers c";

    assert_same(
        &db,
        &customer_orders(JoinKind::Inner).order_by(col("o.order_id"), false),
        &conn,
        &format!("{} INNER JOIN orders o ON c.id = o.customer_id ORDER BY o.order_id", select),
    )?;
    assert_same(
        &db,
        &customer_orders(JoinKind::Left).order_by(col("c.id"), false),
        &conn,
        &format!("{} LEFT JOIN orders o ON c.id = o.customer_id ORDER BY c.id", select),
    )?;
    assert_same_unordered(
        &db,
        &customer_orders(JoinKind::Right),
        &conn,
        &format!("{} RIGHT JOIN orders o ON c.id = o.customer_id", select),
    )?;
    assert_same_unordered(
        &db,
        &customer_orders(JoinKind::Full),
        &conn,
        &format!("{} FULL JOIN orders o ON c.id = o.customer_id", select),
    )?;
    assert_same_unordered(
        &db,
        &customer_orders(JoinKind::AntiLeft),
        &conn,
        &format!("{} LEFT JOIN orders o ON c.id = o.customer_id WHERE o.customer_id IS NULL", select),
    )?;
    assert_same_unordered(
        &db,
        &customer_orders(JoinKind::Cross),
        &conn,
        &format!("{} CROSS JOIN orders o", select),
    )?;
    Ok(())
}

#[test]
fn test_grouping_matches_sqlite() -> Result<()> {
    let db = fixture_db()?;
    let conn = sqlite_fixture()?;

    let plan = QueryPlan::scan("customers")
        .group_by(&["country"])
        .select(vec![
            SelectItem::expr(col("country")),
            SelectItem::expr(sum(col("score"))),
            SelectItem::expr(count_star()),
            SelectItem::expr(avg(col("score"))),
        ])
        .order_by(col("country"), false);
    assert_same(
        &db,
        &plan,
        &conn,
        "SELECT country, SUM(score), COUNT(*), AVG(score) FROM customers GROUP BY country ORDER BY country",
    )?;

    let plan = QueryPlan::scan("customers")
        .group_by(&["country"])
        .select(vec![SelectItem::expr(col("country")), SelectItem::aliased(sum(col("score")), "total")])
        .having(sum(col("score")).gt(lit(800)))
        .order_by(col("total"), true);
    assert_same(
        &db,
        &plan,
        &conn,
        "SELECT country, SUM(score) AS total FROM customers GROUP BY country HAVING SUM(score) > 800 ORDER BY total DESC",
    )?;

    let plan = QueryPlan::scan("customers")
        .filter(col("score").not_eq(lit(0)))
        .group_by(&["country"])
        .select(vec![SelectItem::expr(col("country")), SelectItem::aliased(avg(col("score")), "avg_score")])
        .having(avg(col("score")).gt(lit(430)))
        .order_by(col("avg_score"), false);
    assert_same(
        &db,
        &plan,
        &conn,
        "SELECT country, AVG(score) AS avg_score FROM customers WHERE score != 0 GROUP BY country \
         HAVING AVG(score) > 430 ORDER BY avg_score",
    )?;
    Ok(())
}

#[test]
fn test_filtering_and_ordering_match_sqlite() -> Result<()> {
    let db = fixture_db()?;
    let conn = sqlite_fixture()?;

    assert_same(
        &db,
        &QueryPlan::scan("customers").order_by(col("score"), true).order_by(col("first_name"), false).limit(3),
        &conn,
        "SELECT * FROM customers ORDER BY score DESC, first_name LIMIT 3",
    )?;
    assert_same(
        &db,
        &QueryPlan::scan("customers")
            .filter(col("country").in_list(vec![lit("Germany"), lit("UK")]).and(col("score").between(lit(300), lit(800))))
            .order_by(col("id"), false),
        &conn,
        "SELECT * FROM customers WHERE country IN ('Germany', 'UK') AND score BETWEEN 300 AND 800 ORDER BY id",
    )?;
    assert_same(
        &db,
        &QueryPlan::scan("customers").select_exprs(vec![col("country")]).distinct().order_by(col("country"), false),
        &conn,
        "SELECT DISTINCT country FROM customers ORDER BY country",
    )?;
    assert_same(
        &db,
        &QueryPlan::scan("orders").order_by(col("order_date"), true).limit(2).offset(1),
        &conn,
        "SELECT * FROM orders ORDER BY order_date DESC LIMIT 2 OFFSET 1",
    )?;
    Ok(())
}

#[test]
fn test_like_matches_sqlite_case_insensitive() -> Result<()> {
    // SQLite's LIKE ignores ASCII case
    let db = fixture_db_with(EngineConfig::default().with_like_case_sensitive(false))?;
    let conn = sqlite_fixture()?;
    for pattern in ["m%", "%R%", "_e%", "%a"] {
        assert_same(
            &db,
            &QueryPlan::scan("customers").filter(col("first_name").like(pattern)).order_by(col("id"), false),
            &conn,
            &format!("SELECT * FROM customers WHERE first_name LIKE '{}' ORDER BY id", pattern),
        )?;
    }
    Ok(())
}

#[test]
fn test_null_handling_matches_sqlite() -> Result<()> {
    let db = fixture_db()?;
    let conn = sqlite_fixture()?;
    db.execute(Statement::insert_values("customers", vec![vec![lit(6), lit("Anna"), null(), null()]]))?;
    conn.execute("INSERT INTO customers VALUES (6, 'Anna', NULL, NULL)", [])?;

    assert_same(
        &db,
        &QueryPlan::scan("customers").order_by(col("score"), false).order_by(col("id"), false),
        &conn,
        "SELECT * FROM customers ORDER BY score, id",
    )?;
    assert_same(
        &db,
        &QueryPlan::scan("customers").filter(col("score").lt(lit(500)).or(col("country").is_null())),
        &conn,
        "SELECT * FROM customers WHERE score < 500 OR country IS NULL",
    )?;
    assert_same(
        &db,
        &QueryPlan::scan("customers")
            .group_by(&["country"])
            .select(vec![SelectItem::expr(col("country")), SelectItem::expr(sum(col("score")))])
            .order_by(col("country"), false),
        &conn,
        "SELECT country, SUM(score) FROM customers GROUP BY country ORDER BY country",
    )?;
    Ok(())
}
