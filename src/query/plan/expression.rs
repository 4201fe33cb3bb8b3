// Expression Tree
//
// Expressions are the scalar and boolean nodes of a query plan: literals,
// column references, operators, predicates and aggregate calls.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::executor::result::DataValue;

/// Column reference (could be qualified with table name or alias)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    /// Parse `name` or `table.name`
    pub fn parse(reference: &str) -> Self {
        match reference.split_once('.') {
            Some((table, name)) => ColumnRef {
                table: Some(table.to_string()),
                name: name.to_string(),
            },
            None => ColumnRef {
                table: None,
                name: reference.to_string(),
            },
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    // Comparison
    Equals,
    NotEquals,
    LessThan,
    LessEquals,
    GreaterThan,
    GreaterEquals,
    // Logical
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::LessThan
                | BinaryOperator::LessEquals
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEquals
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEquals => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEquals => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        };
        write!(f, "{}", symbol)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        };
        write!(f, "{}", name)
    }
}

/// Scalar functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarFunction {
    Coalesce,
    Upper,
    Lower,
    Length,
    Concat,
}

impl fmt::Display for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarFunction::Coalesce => "COALESCE",
            ScalarFunction::Upper => "UPPER",
            ScalarFunction::Lower => "LOWER",
            ScalarFunction::Length => "LENGTH",
            ScalarFunction::Concat => "CONCAT",
        };
        write!(f, "{}", name)
    }
}

/// Expression in a query plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(DataValue),
    /// Column reference
    Column(ColumnRef),
    /// Binary operation (e.g., a + b, x = y, p AND q)
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    /// NOT / unary minus
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    /// `expr IS [NOT] NULL`
    IsNull {
        expr: Box<Expression>,
        negated: bool,
    },
    /// `expr [NOT] BETWEEN low AND high`
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
    },
    /// `expr [NOT] IN (list)`
    InList {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },
    /// `expr [NOT] LIKE pattern`
    Like {
        expr: Box<Expression>,
        pattern: Box<Expression>,
        negated: bool,
    },
    /// Scalar function call
    Function {
        func: ScalarFunction,
        args: Vec<Expression>,
    },
    /// Aggregate call; `arg: None` is `COUNT(*)`
    Aggregate {
        function: AggregateFunction,
        arg: Option<Box<Expression>>,
        distinct: bool,
    },
}

/// Column reference expression from `name` or `table.name`
pub fn col(reference: &str) -> Expression {
    Expression::Column(ColumnRef::parse(reference))
}

/// Literal expression
pub fn lit(value: impl Into<DataValue>) -> Expression {
    Expression::Literal(value.into())
}

/// NULL literal
pub fn null() -> Expression {
    Expression::Literal(DataValue::Null)
}

/// Logical negation
pub fn not(expr: Expression) -> Expression {
    Expression::UnaryOp {
        op: UnaryOperator::Not,
        expr: Box::new(expr),
    }
}

/// `COUNT(*)`
pub fn count_star() -> Expression {
    Expression::Aggregate {
        function: AggregateFunction::Count,
        arg: None,
        distinct: false,
    }
}

fn aggregate(function: AggregateFunction, arg: Expression, distinct: bool) -> Expression {
    Expression::Aggregate {
        function,
        arg: Some(Box::new(arg)),
        distinct,
    }
}

pub fn count(arg: Expression) -> Expression {
    aggregate(AggregateFunction::Count, arg, false)
}

pub fn count_distinct(arg: Expression) -> Expression {
    aggregate(AggregateFunction::Count, arg, true)
}

pub fn sum(arg: Expression) -> Expression {
    aggregate(AggregateFunction::Sum, arg, false)
}

pub fn avg(arg: Expression) -> Expression {
    aggregate(AggregateFunction::Avg, arg, false)
}

pub fn min(arg: Expression) -> Expression {
    aggregate(AggregateFunction::Min, arg, false)
}

pub fn max(arg: Expression) -> Expression {
    aggregate(AggregateFunction::Max, arg, false)
}

/// Scalar function call
pub fn func(func: ScalarFunction, args: Vec<Expression>) -> Expression {
    Expression::Function { func, args }
}

impl Expression {
    fn binary(self, op: BinaryOperator, right: Expression) -> Expression {
        Expression::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Equals, right)
    }

    pub fn not_eq(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::NotEquals, right)
    }

    pub fn lt(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::LessThan, right)
    }

    pub fn lt_eq(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::LessEquals, right)
    }

    pub fn gt(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::GreaterThan, right)
    }

    pub fn gt_eq(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::GreaterEquals, right)
    }

    pub fn and(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::And, right)
    }

    pub fn or(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Or, right)
    }

    pub fn plus(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Plus, right)
    }

    pub fn minus(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Minus, right)
    }

    pub fn multiply(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Multiply, right)
    }

    pub fn divide(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Divide, right)
    }

    pub fn modulo(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Modulo, right)
    }

    pub fn is_null(self) -> Expression {
        Expression::IsNull { expr: Box::new(self), negated: false }
    }

    pub fn is_not_null(self) -> Expression {
        Expression::IsNull { expr: Box::new(self), negated: true }
    }

    pub fn between(self, low: Expression, high: Expression) -> Expression {
        Expression::Between {
            expr: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    pub fn not_between(self, low: Expression, high: Expression) -> Expression {
        Expression::Between {
            expr: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: true,
        }
    }

    pub fn in_list(self, list: Vec<Expression>) -> Expression {
        Expression::InList { expr: Box::new(self), list, negated: false }
    }

    pub fn not_in_list(self, list: Vec<Expression>) -> Expression {
        Expression::InList { expr: Box::new(self), list, negated: true }
    }

    pub fn like(self, pattern: &str) -> Expression {
        Expression::Like {
            expr: Box::new(self),
            pattern: Box::new(lit(pattern)),
            negated: false,
        }
    }

    pub fn not_like(self, pattern: &str) -> Expression {
        Expression::Like {
            expr: Box::new(self),
            pattern: Box::new(lit(pattern)),
            negated: true,
        }
    }

    /// True if an aggregate call appears anywhere in this expression
    pub fn contains_aggregate(&self) -> bool {
        let mut found = Vec::new();
        self.collect_aggregates(&mut found);
        !found.is_empty()
    }

    /// Collect the aggregate calls of this expression (outermost only),
    /// skipping ones already present
    pub fn collect_aggregates(&self, out: &mut Vec<Expression>) {
        match self {
            Expression::Aggregate { .. } => {
                if !out.contains(self) {
                    out.push(self.clone());
                }
            }
            _ => self.for_each_child(|child| child.collect_aggregates(out)),
        }
    }

    /// Collect the column references that appear outside aggregate calls
    pub fn collect_bare_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expression::Column(col_ref) => out.push(col_ref),
            Expression::Aggregate { .. } => {}
            Expression::Literal(_) => {}
            Expression::BinaryOp { left, right, .. } => {
                left.collect_bare_columns(out);
                right.collect_bare_columns(out);
            }
            Expression::UnaryOp { expr, .. } | Expression::IsNull { expr, .. } => expr.collect_bare_columns(out),
            Expression::Between { expr, low, high, .. } => {
                expr.collect_bare_columns(out);
                low.collect_bare_columns(out);
                high.collect_bare_columns(out);
            }
            Expression::InList { expr, list, .. } => {
                expr.collect_bare_columns(out);
                for item in list {
                    item.collect_bare_columns(out);
                }
            }
            Expression::Like { expr, pattern, .. } => {
                expr.collect_bare_columns(out);
                pattern.collect_bare_columns(out);
            }
            Expression::Function { args, .. } => {
                for arg in args {
                    arg.collect_bare_columns(out);
                }
            }
        }
    }

    fn for_each_child<'a>(&'a self, mut f: impl FnMut(&'a Expression)) {
        match self {
            Expression::Literal(_) | Expression::Column(_) => {}
            Expression::BinaryOp { left, right, .. } => {
                f(left);
                f(right);
            }
            Expression::UnaryOp { expr, .. } | Expression::IsNull { expr, .. } => f(expr),
            Expression::Between { expr, low, high, .. } => {
                f(expr);
                f(low);
                f(high);
            }
            Expression::InList { expr, list, .. } => {
                f(expr);
                list.iter().for_each(f);
            }
            Expression::Like { expr, pattern, .. } => {
                f(expr);
                f(pattern);
            }
            Expression::Function { args, .. } => args.iter().for_each(f),
            Expression::Aggregate { arg, .. } => {
                if let Some(arg) = arg {
                    f(arg);
                }
            }
        }
    }
}

/// Canonical text of an expression. Also the output column name of
/// unaliased projections and the key under which aggregate results travel.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Nested operator nodes are parenthesized so the text stays unambiguous
        fn operand(expr: &Expression) -> String {
            match expr {
                Expression::BinaryOp { .. } => format!("({})", expr),
                _ => expr.to_string(),
            }
        }
        fn negation(negated: bool) -> &'static str {
            if negated { "NOT " } else { "" }
        }

        match self {
            Expression::Literal(value) => write!(f, "{}", value.to_sql_literal()),
            Expression::Column(col_ref) => write!(f, "{}", col_ref),
            Expression::BinaryOp { left, op, right } => write!(f, "{} {} {}", operand(left), op, operand(right)),
            Expression::UnaryOp { op: UnaryOperator::Not, expr } => write!(f, "NOT {}", operand(expr)),
            Expression::UnaryOp { op: UnaryOperator::Minus, expr } => write!(f, "-{}", operand(expr)),
            Expression::IsNull { expr, negated } => write!(f, "{} IS {}NULL", operand(expr), negation(*negated)),
            Expression::Between { expr, low, high, negated } => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                operand(expr),
                negation(*negated),
                operand(low),
                operand(high)
            ),
            Expression::InList { expr, list, negated } => {
                let items: Vec<String> = list.iter().map(|e| e.to_string()).collect();
                write!(f, "{} {}IN ({})", operand(expr), negation(*negated), items.join(", "))
            }
            Expression::Like { expr, pattern, negated } => {
                write!(f, "{} {}LIKE {}", operand(expr), negation(*negated), operand(pattern))
            }
            Expression::Function { func, args } => {
                let items: Vec<String> = args.iter().map(|e| e.to_string()).collect();
                write!(f, "{}({})", func, items.join(", "))
            }
            Expression::Aggregate { function, arg, distinct } => match arg {
                None => write!(f, "{}(*)", function),
                Some(arg) => write!(f, "{}({}{})", function, if *distinct { "DISTINCT " } else { "" }, arg),
            },
        }
    }
}
