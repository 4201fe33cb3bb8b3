// Demo Dataset
//
// The customers/orders teaching dataset and a tour of queries over it, as
// run by `minirel demo`.

use crate::catalog::{Column, DataType};
use crate::query::executor::result::DataValue;
use crate::query::plan::{
    avg, col, count_star, lit, null, sum, AlterTableOperation, Assignment, Expression, JoinKind, QueryPlan,
    SelectItem, Source, Statement,
};

/// One titled step of the tour
pub struct DemoStep {
    pub title: &'static str,
    pub statement: Statement,
}

fn step(title: &'static str, statement: Statement) -> DemoStep {
    DemoStep { title, statement }
}

fn date(text: &str) -> Expression {
    // Literal dates are stored as text and coerced on insert
    lit(text)
}

/// Statements creating and filling `customers` and `orders`
pub fn setup_statements() -> Vec<Statement> {
    vec![
        Statement::CreateTable {
            name: "customers".to_string(),
            columns: vec![
                Column::new("id", DataType::Integer, false, true, None),
                Column::new("first_name", DataType::Varchar(50), false, false, None),
                Column::nullable("country", DataType::Varchar(50)),
                Column::nullable("score", DataType::Integer),
            ],
            primary_key: vec![],
        },
        Statement::insert_values(
            "customers",
            vec![
                vec![lit(1), lit("Maria"), lit("Germany"), lit(350)],
                vec![lit(2), lit("John"), lit("USA"), lit(900)],
                vec![lit(3), lit("Georg"), lit("UK"), lit(750)],
                vec![lit(4), lit("Martin"), lit("Germany"), lit(500)],
                vec![lit(5), lit("Peter"), lit("USA"), lit(0)],
            ],
        ),
        Statement::CreateTable {
            name: "orders".to_string(),
            columns: vec![
                Column::new("order_id", DataType::Integer, false, true, None),
                Column::new("customer_id", DataType::Integer, false, false, None),
                Column::new("order_date", DataType::Date, true, false, None),
                Column::nullable("sales", DataType::Integer),
            ],
            primary_key: vec![],
        },
        Statement::insert_values(
            "orders",
            vec![
                vec![lit(1001), lit(1), date("2021-01-11"), lit(35)],
                vec![lit(1002), lit(2), date("2021-04-05"), lit(15)],
                vec![lit(1003), lit(3), date("2021-06-18"), lit(20)],
                vec![lit(1004), lit(6), date("2021-08-31"), lit(10)],
            ],
        ),
    ]
}

fn customers_join_orders(kind: JoinKind) -> QueryPlan {
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

/// The guided tour, in order
pub fn tutorial_steps() -> Vec<DemoStep> {
    vec![
        step("All customers", Statement::Query(QueryPlan::scan("customers"))),
        step(
            "Customers whose score is not 0",
            Statement::Query(QueryPlan::scan("customers").filter(col("score").not_eq(lit(0)))),
        ),
        step(
            "Customers from Germany",
            Statement::Query(QueryPlan::scan("customers").filter(col("country").eq(lit("Germany")))),
        ),
        step(
            "Customers by highest score",
            Statement::Query(QueryPlan::scan("customers").order_by(col("score"), true)),
        ),
        step(
            "Customers by country, then highest score",
            Statement::Query(
                QueryPlan::scan("customers")
                    .order_by(col("country"), false)
                    .order_by(col("score"), true),
            ),
        ),
        step(
            "Total score per country",
            Statement::Query(
                QueryPlan::scan("customers")
                    .group_by(&["country"])
                    .select(vec![
                        SelectItem::expr(col("country")),
                        SelectItem::aliased(sum(col("score")), "total_score"),
                        SelectItem::aliased(count_star(), "total_customers"),
                    ]),
            ),
        ),
        step(
            "Average score per country, only above 430, ignoring score 0",
            Statement::Query(
                QueryPlan::scan("customers")
                    .filter(col("score").not_eq(lit(0)))
                    .group_by(&["country"])
                    .select(vec![
                        SelectItem::expr(col("country")),
                        SelectItem::aliased(avg(col("score")), "avg_score"),
                    ])
                    .having(avg(col("score")).gt(lit(430))),
            ),
        ),
        step(
            "Countries with total score above 800",
            Statement::Query(
                QueryPlan::scan("customers")
                    .group_by(&["country"])
                    .select(vec![
                        SelectItem::expr(col("country")),
                        SelectItem::aliased(sum(col("score")), "total_score"),
                    ])
                    .having(sum(col("score")).gt(lit(800))),
            ),
        ),
        step(
            "Distinct countries",
            Statement::Query(QueryPlan::scan("customers").select_exprs(vec![col("country")]).distinct()),
        ),
        step(
            "Top 3 customers by score",
            Statement::Query(QueryPlan::scan("customers").order_by(col("score"), true).limit(3)),
        ),
        step(
            "First names starting with M",
            Statement::Query(QueryPlan::scan("customers").filter(col("first_name").like("M%"))),
        ),
        step(
            "Scores between 100 and 500",
            Statement::Query(QueryPlan::scan("customers").filter(col("score").between(lit(100), lit(500)))),
        ),
        step(
            "Customers from Germany or USA",
            Statement::Query(
                QueryPlan::scan("customers").filter(col("country").in_list(vec![lit("Germany"), lit("USA")])),
            ),
        ),
        step("Customers with their orders (INNER JOIN)", Statement::Query(customers_join_orders(JoinKind::Inner))),
        step("All customers, orders if any (LEFT JOIN)", Statement::Query(customers_join_orders(JoinKind::Left))),
        step("All orders, customers if any (RIGHT JOIN)", Statement::Query(customers_join_orders(JoinKind::Right))),
        step("Everything (FULL JOIN)", Statement::Query(customers_join_orders(JoinKind::Full))),
        step("Customers without orders (LEFT ANTI JOIN)", Statement::Query(customers_join_orders(JoinKind::AntiLeft))),
        step("Orders without customers (RIGHT ANTI JOIN)", Statement::Query(customers_join_orders(JoinKind::AntiRight))),
        step(
            "Every customer with every order (CROSS JOIN)",
            Statement::Query(
                QueryPlan::from(Source::table("customers").join(Source::table("orders"), JoinKind::Cross, None))
                    .select_exprs(vec![col("first_name"), col("order_id")]),
            ),
        ),
        step(
            "Add a customer without a score",
            Statement::insert_values("customers", vec![vec![lit(6), lit("Anna"), lit("USA"), null()]]),
        ),
        step(
            "Customers without a score",
            Statement::Query(QueryPlan::scan("customers").filter(col("score").is_null())),
        ),
        step(
            "Give Anna a score of 100",
            Statement::Update {
                table: "customers".to_string(),
                assignments: vec![Assignment::new("score", lit(100))],
                predicate: Some(col("id").eq(lit(6))),
            },
        ),
        step(
            "Remove customers with a score of 0",
            Statement::Delete {
                table: "customers".to_string(),
                predicate: Some(col("score").eq(lit(0))),
            },
        ),
        step(
            "Create a persons table",
            Statement::CreateTable {
                name: "persons".to_string(),
                columns: vec![
                    Column::new("id", DataType::Integer, false, true, None),
                    Column::new("person_name", DataType::Varchar(50), false, false, None),
                    Column::new("birth_date", DataType::Date, true, false, None),
                    Column::new("phone", DataType::Varchar(15), false, false, None),
                ],
                primary_key: vec![],
            },
        ),
        step(
            "Add an email column",
            Statement::AlterTable {
                table: "persons".to_string(),
                operation: AlterTableOperation::AddColumn(Column::new(
                    "email",
                    DataType::Varchar(50),
                    false,
                    false,
                    Some(DataValue::from("unknown")),
                )),
            },
        ),
        step(
            "Drop the phone column",
            Statement::AlterTable {
                table: "persons".to_string(),
                operation: AlterTableOperation::DropColumn("phone".to_string()),
            },
        ),
        step(
            "Drop the persons table",
            Statement::DropTable { name: "persons".to_string(), if_exists: false },
        ),
    ]
}
