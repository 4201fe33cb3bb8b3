// Query Plan Module
//
// Structured, already-parsed statements and query plans. These are the
// input of the engine: an external parser (or a caller building plans by
// hand) produces them, the executor consumes them.

pub mod expression;

use serde::{Deserialize, Serialize};

use crate::catalog::Column;

pub use self::expression::{
    avg, col, count, count_distinct, count_star, func, lit, max, min, not, null, sum, AggregateFunction,
    BinaryOperator, ColumnRef, Expression, ScalarFunction, UnaryOperator,
};

/// Join kinds. Every kind is executed by the single nested-loop join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    /// Union of the left and right join results
    Full,
    Cross,
    /// Left rows without a matching right row
    AntiLeft,
    /// Right rows without a matching left row
    AntiRight,
}

/// Where a query reads its rows from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    Table { name: String, alias: Option<String> },
    Join(Box<JoinSpec>),
}

impl Source {
    pub fn table(name: &str) -> Self {
        Source::Table { name: name.to_string(), alias: None }
    }

    pub fn aliased(name: &str, alias: &str) -> Self {
        Source::Table {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    /// Join this source with `right`
    pub fn join(self, right: Source, kind: JoinKind, on: Option<Expression>) -> Self {
        Source::Join(Box::new(JoinSpec { left: self, right, kind, on }))
    }
}

/// Two sources combined by a join kind and predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub left: Source,
    pub right: Source,
    pub kind: JoinKind,
    /// Join predicate; ignored by cross joins
    pub on: Option<Expression>,
}

/// Item of the projection list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `table.*`
    QualifiedWildcard(String),
    /// Expression with optional alias
    Expr { expr: Expression, alias: Option<String> },
}

impl SelectItem {
    pub fn expr(expr: Expression) -> Self {
        SelectItem::Expr { expr, alias: None }
    }

    pub fn aliased(expr: Expression, alias: &str) -> Self {
        SelectItem::Expr {
            expr,
            alias: Some(alias.to_string()),
        }
    }
}

/// ORDER BY key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expr: Expression,
    #[serde(default)]
    pub descending: bool,
}

/// LIMIT / OFFSET. Signed so that negative values can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub count: i64,
    #[serde(default)]
    pub offset: i64,
}

/// A structured SELECT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub source: Source,
    #[serde(default)]
    pub filter: Option<Expression>,
    #[serde(default)]
    pub group_by: Vec<ColumnRef>,
    #[serde(default = "default_projection")]
    pub projection: Vec<SelectItem>,
    #[serde(default)]
    pub having: Option<Expression>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub order_by: Vec<OrderByItem>,
    #[serde(default)]
    pub limit: Option<Limit>,
}

fn default_projection() -> Vec<SelectItem> {
    vec![SelectItem::Wildcard]
}

impl QueryPlan {
    /// `SELECT * FROM source`
    pub fn from(source: Source) -> Self {
        QueryPlan {
            source,
            filter: None,
            group_by: Vec::new(),
            projection: default_projection(),
            having: None,
            distinct: false,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// `SELECT * FROM table`
    pub fn scan(table: &str) -> Self {
        QueryPlan::from(Source::table(table))
    }

    /// WHERE clause
    pub fn filter(mut self, predicate: Expression) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Replace the projection list
    pub fn select(mut self, items: Vec<SelectItem>) -> Self {
        self.projection = items;
        self
    }

    /// Replace the projection list with unaliased expressions
    pub fn select_exprs(self, exprs: Vec<Expression>) -> Self {
        self.select(exprs.into_iter().map(SelectItem::expr).collect())
    }

    /// GROUP BY columns, given as `name` or `table.name`
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by = columns.iter().map(|c| ColumnRef::parse(c)).collect();
        self
    }

    pub fn having(mut self, predicate: Expression) -> Self {
        self.having = Some(predicate);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Append an ORDER BY key
    pub fn order_by(mut self, expr: Expression, descending: bool) -> Self {
        self.order_by.push(OrderByItem { expr, descending });
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        let offset = self.limit.map(|l| l.offset).unwrap_or(0);
        self.limit = Some(Limit { count, offset });
        self
    }

    /// OFFSET without an explicit LIMIT keeps every remaining row
    pub fn offset(mut self, offset: i64) -> Self {
        let count = self.limit.map(|l| l.count).unwrap_or(i64::MAX);
        self.limit = Some(Limit { count, offset });
        self
    }
}

/// Rows supplied to an INSERT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
    Values(Vec<Vec<Expression>>),
    Query(Box<QueryPlan>),
}

/// `column = expr` in an UPDATE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Expression,
}

impl Assignment {
    pub fn new(column: &str, value: Expression) -> Self {
        Assignment { column: column.to_string(), value }
    }
}

/// ALTER TABLE operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterTableOperation {
    AddColumn(Column),
    DropColumn(String),
    RenameColumn { old: String, new: String },
}

/// A statement handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    CreateTable {
        name: String,
        columns: Vec<Column>,
        #[serde(default)]
        primary_key: Vec<String>,
    },
    DropTable {
        name: String,
        #[serde(default)]
        if_exists: bool,
    },
    Insert {
        table: String,
        #[serde(default)]
        columns: Option<Vec<String>>,
        source: InsertSource,
    },
    Update {
        table: String,
        assignments: Vec<Assignment>,
        #[serde(default)]
        predicate: Option<Expression>,
    },
    Delete {
        table: String,
        #[serde(default)]
        predicate: Option<Expression>,
    },
    Truncate {
        table: String,
    },
    AlterTable {
        table: String,
        operation: AlterTableOperation,
    },
    Query(QueryPlan),
}

impl Statement {
    /// `INSERT INTO table VALUES (...), (...)` with literal rows
    pub fn insert_values(table: &str, rows: Vec<Vec<Expression>>) -> Self {
        Statement::Insert {
            table: table.to_string(),
            columns: None,
            source: InsertSource::Values(rows),
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateTable { .. } => "CREATE TABLE",
            Statement::DropTable { .. } => "DROP TABLE",
            Statement::Insert { .. } => "INSERT",
            Statement::Update { .. } => "UPDATE",
            Statement::Delete { .. } => "DELETE",
            Statement::Truncate { .. } => "TRUNCATE",
            Statement::AlterTable { .. } => "ALTER TABLE",
            Statement::Query(_) => "SELECT",
        }
    }
}
