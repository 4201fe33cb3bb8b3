// Expression Evaluation
//
// Evaluates plan expressions against a row context: a single row, or the
// left/right pair a join condition sees before the rows are combined.

use std::cmp::Ordering;

use crate::config::EngineConfig;
use crate::query::executor::predicate::{LikePattern, Truth};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};
use crate::query::plan::{BinaryOperator, ColumnRef, Expression, ScalarFunction, UnaryOperator};

/// The row (or pair of rows) an expression is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    left: &'a Row,
    right: Option<&'a Row>,
}

impl<'a> RowContext<'a> {
    pub fn single(row: &'a Row) -> Self {
        RowContext { left: row, right: None }
    }

    /// Join context: columns resolve across both sides
    pub fn pair(left: &'a Row, right: &'a Row) -> Self {
        RowContext { left, right: Some(right) }
    }

    fn rows(&self) -> impl Iterator<Item = &'a Row> {
        std::iter::once(self.left).chain(self.right)
    }

    /// Value of a column reference
    pub fn lookup(&self, col_ref: &ColumnRef) -> QueryResult<&'a DataValue> {
        let columns = self.rows().flat_map(|row| row.columns()).map(|c| c.as_str());
        let name = resolve_name(columns, col_ref)?;
        self.rows()
            .find_map(|row| row.get(name))
            .ok_or_else(|| QueryError::ColumnNotFound(col_ref.to_string()))
    }

    /// Value stored under an exact column name
    fn exact(&self, name: &str) -> Option<&'a DataValue> {
        self.rows().find_map(|row| row.get(name))
    }
}

/// Resolve a column reference against a list of row column names.
///
/// A qualified reference must match `table.name` exactly. An unqualified one
/// matches a column of exactly that name first, otherwise the single column
/// ending in `.name`; several such columns make the reference ambiguous.
pub fn resolve_name<'c, I>(columns: I, col_ref: &ColumnRef) -> QueryResult<&'c str>
where
    I: IntoIterator<Item = &'c str>,
{
    let columns: Vec<&'c str> = columns.into_iter().collect();

    if let Some(table) = &col_ref.table {
        let qualified = format!("{}.{}", table, col_ref.name);
        return columns
            .iter()
            .find(|c| **c == qualified)
            .copied()
            .ok_or_else(|| QueryError::ColumnNotFound(qualified));
    }

    if let Some(exact) = columns.iter().find(|c| **c == col_ref.name) {
        return Ok(*exact);
    }

    let suffix = format!(".{}", col_ref.name);
    let mut matches = columns.iter().filter(|c| c.ends_with(&suffix));
    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(*found),
        (Some(first), Some(second)) => Err(QueryError::AmbiguousColumn(format!(
            "{} (could be {} or {})",
            col_ref.name, first, second
        ))),
        (None, _) => Err(QueryError::ColumnNotFound(col_ref.name.clone())),
    }
}

/// Evaluate an expression to a value
pub fn evaluate_expression(expr: &Expression, ctx: &RowContext<'_>, config: &EngineConfig) -> QueryResult<DataValue> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Column(col_ref) => ctx.lookup(col_ref).cloned(),
        Expression::BinaryOp { left, op, right } => {
            if op.is_logical() {
                let l = evaluate_predicate(left, ctx, config)?;
                // Short-circuit where the other side cannot change the answer
                let result = match (op, l) {
                    (BinaryOperator::And, Truth::False) => Truth::False,
                    (BinaryOperator::Or, Truth::True) => Truth::True,
                    (BinaryOperator::And, _) => l.and(evaluate_predicate(right, ctx, config)?),
                    _ => l.or(evaluate_predicate(right, ctx, config)?),
                };
                return Ok(result.into_value());
            }
            let l = evaluate_expression(left, ctx, config)?;
            let r = evaluate_expression(right, ctx, config)?;
            if op.is_comparison() {
                Ok(compare_values(&l, *op, &r)?.into_value())
            } else {
                arithmetic(&l, *op, &r)
            }
        }
        Expression::UnaryOp { op: UnaryOperator::Not, expr } => {
            Ok((!evaluate_predicate(expr, ctx, config)?).into_value())
        }
        Expression::UnaryOp { op: UnaryOperator::Minus, expr } => match evaluate_expression(expr, ctx, config)? {
            DataValue::Null => Ok(DataValue::Null),
            DataValue::Integer(i) => i.checked_neg().map(DataValue::Integer).ok_or(QueryError::NumericOverflow),
            DataValue::Float(f) => Ok(DataValue::Float(-f)),
            other => Err(QueryError::TypeError(format!("Cannot negate {}", other.type_name()))),
        },
        Expression::IsNull { expr, negated } => {
            let is_null = evaluate_expression(expr, ctx, config)?.is_null();
            Ok(DataValue::Boolean(is_null != *negated))
        }
        Expression::Between { expr, low, high, negated } => {
            let value = evaluate_expression(expr, ctx, config)?;
            let low = evaluate_expression(low, ctx, config)?;
            let high = evaluate_expression(high, ctx, config)?;
            let inside = compare_values(&value, BinaryOperator::GreaterEquals, &low)?
                .and(compare_values(&value, BinaryOperator::LessEquals, &high)?);
            Ok(negate_if(inside, *negated).into_value())
        }
        Expression::InList { expr, list, negated } => {
            let value = evaluate_expression(expr, ctx, config)?;
            let mut found = Truth::False;
            for item in list {
                let candidate = evaluate_expression(item, ctx, config)?;
                found = found.or(compare_values(&value, BinaryOperator::Equals, &candidate)?);
                if found == Truth::True {
                    break;
                }
            }
            Ok(negate_if(found, *negated).into_value())
        }
        Expression::Like { expr, pattern, negated } => {
            let value = evaluate_expression(expr, ctx, config)?;
            let pattern = evaluate_expression(pattern, ctx, config)?;
            let matched = match (&value, &pattern) {
                (DataValue::Null, _) | (_, DataValue::Null) => Truth::Unknown,
                (value, DataValue::Text(pattern)) => {
                    let compiled = LikePattern::compile(pattern, config.like_case_sensitive);
                    Truth::from(compiled.matches(&value.to_string()))
                }
                (_, other) => {
                    return Err(QueryError::TypeError(format!(
                        "LIKE pattern must be TEXT, got {}",
                        other.type_name()
                    )));
                }
            };
            Ok(negate_if(matched, *negated).into_value())
        }
        Expression::Function { func, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate_expression(arg, ctx, config))
                .collect::<QueryResult<Vec<_>>>()?;
            call_function(*func, values)
        }
        Expression::Aggregate { .. } => {
            // Aggregates are computed by the aggregation stage and travel in
            // the row under their canonical text
            let key = expr.to_string();
            ctx.exact(&key).cloned().ok_or_else(|| {
                QueryError::ValidationError(format!("Aggregate {} is not allowed in this context", key))
            })
        }
    }
}

/// Evaluate an expression as a condition
pub fn evaluate_predicate(expr: &Expression, ctx: &RowContext<'_>, config: &EngineConfig) -> QueryResult<Truth> {
    let value = evaluate_expression(expr, ctx, config)?;
    Truth::from_value(&value).ok_or_else(|| {
        QueryError::TypeError(format!(
            "Condition {} must be BOOLEAN, got {}",
            expr,
            value.type_name()
        ))
    })
}

fn negate_if(truth: Truth, negated: bool) -> Truth {
    if negated { !truth } else { truth }
}

/// Comparison with NULL is unknown
fn compare_values(left: &DataValue, op: BinaryOperator, right: &DataValue) -> QueryResult<Truth> {
    let Some(ordering) = left.sql_compare(right)? else {
        return Ok(Truth::Unknown);
    };
    let result = match op {
        BinaryOperator::Equals => ordering == Ordering::Equal,
        BinaryOperator::NotEquals => ordering != Ordering::Equal,
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessEquals => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        BinaryOperator::GreaterEquals => ordering != Ordering::Less,
        _ => return Err(QueryError::ExecutionError(format!("{} is not a comparison", op))),
    };
    Ok(Truth::from(result))
}

fn arithmetic(left: &DataValue, op: BinaryOperator, right: &DataValue) -> QueryResult<DataValue> {
    match (left, right) {
        (DataValue::Null, _) | (_, DataValue::Null) => Ok(DataValue::Null),
        (DataValue::Integer(a), DataValue::Integer(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOperator::Plus => a.checked_add(b),
                BinaryOperator::Minus => a.checked_sub(b),
                BinaryOperator::Multiply => a.checked_mul(b),
                BinaryOperator::Divide | BinaryOperator::Modulo if b == 0 => {
                    return Err(QueryError::DivisionByZero);
                }
                BinaryOperator::Divide => a.checked_div(b),
                BinaryOperator::Modulo => a.checked_rem(b),
                _ => return Err(QueryError::ExecutionError(format!("{} is not arithmetic", op))),
            };
            result.map(DataValue::Integer).ok_or(QueryError::NumericOverflow)
        }
        (DataValue::Integer(_) | DataValue::Float(_), DataValue::Integer(_) | DataValue::Float(_)) => {
            let a = as_float(left);
            let b = as_float(right);
            let result = match op {
                BinaryOperator::Plus => a + b,
                BinaryOperator::Minus => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::Divide | BinaryOperator::Modulo if b == 0.0 => {
                    return Err(QueryError::DivisionByZero);
                }
                BinaryOperator::Divide => a / b,
                BinaryOperator::Modulo => a % b,
                _ => return Err(QueryError::ExecutionError(format!("{} is not arithmetic", op))),
            };
            Ok(DataValue::Float(result))
        }
        (a, b) => Err(QueryError::TypeError(format!(
            "Cannot apply {} to {} and {}",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn as_float(value: &DataValue) -> f64 {
    match value {
        DataValue::Integer(i) => *i as f64,
        DataValue::Float(f) => *f,
        _ => f64::NAN,
    }
}

fn call_function(func: ScalarFunction, args: Vec<DataValue>) -> QueryResult<DataValue> {
    let single = |args: &[DataValue]| -> QueryResult<DataValue> {
        match args {
            [value] => Ok(value.clone()),
            _ => Err(QueryError::ValidationError(format!(
                "{} takes exactly one argument, got {}",
                func,
                args.len()
            ))),
        }
    };

    match func {
        ScalarFunction::Coalesce => Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or(DataValue::Null)),
        ScalarFunction::Concat => {
            let joined: String = args.iter().filter(|v| !v.is_null()).map(|v| v.to_string()).collect();
            Ok(DataValue::Text(joined))
        }
        ScalarFunction::Upper => Ok(match single(&args)? {
            DataValue::Null => DataValue::Null,
            value => DataValue::Text(value.to_string().to_uppercase()),
        }),
        ScalarFunction::Lower => Ok(match single(&args)? {
            DataValue::Null => DataValue::Null,
            value => DataValue::Text(value.to_string().to_lowercase()),
        }),
        ScalarFunction::Length => Ok(match single(&args)? {
            DataValue::Null => DataValue::Null,
            value => DataValue::Integer(value.to_string().chars().count() as i64),
        }),
    }
}
