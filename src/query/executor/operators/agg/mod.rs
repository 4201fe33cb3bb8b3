// Aggregation Operators Module
//
// This module contains operators for performing SQL aggregation operations
// such as GROUP BY, HAVING, and aggregate functions (COUNT, SUM, AVG, etc.)

mod hash;

pub use hash::{create_hash_aggregate, filter_groups, group_rows, HashAggregateOperator};

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::query::executor::result::{DataValue, QueryError, QueryResult};
use crate::query::plan::{AggregateFunction, Expression};

/// One aggregate call to compute per group
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    /// Argument; `None` is `COUNT(*)`
    pub arg: Option<Expression>,
    pub distinct: bool,
    /// Column name the result is emitted under
    pub output_name: String,
}

impl AggregateSpec {
    /// Build from an `Expression::Aggregate` node
    pub fn from_expression(expr: &Expression) -> QueryResult<Self> {
        let Expression::Aggregate { function, arg, distinct } = expr else {
            return Err(QueryError::ExecutionError(format!("{} is not an aggregate call", expr)));
        };
        if let Some(arg) = arg {
            if arg.contains_aggregate() {
                return Err(QueryError::ValidationError(format!(
                    "Aggregate calls cannot be nested: {}",
                    expr
                )));
            }
        } else if *function != AggregateFunction::Count {
            return Err(QueryError::ValidationError(format!("{}(*) is not supported", function)));
        }
        if *distinct && !matches!(function, AggregateFunction::Count | AggregateFunction::Sum) {
            return Err(QueryError::ValidationError(format!("DISTINCT is not supported for {}", function)));
        }
        Ok(AggregateSpec {
            function: *function,
            arg: arg.as_deref().cloned(),
            distinct: *distinct,
            output_name: expr.to_string(),
        })
    }
}

/// Running state of one aggregate within one group
#[derive(Debug, Clone)]
pub(crate) struct Accumulator {
    function: AggregateFunction,
    /// Rows seen (COUNT(*)) or non-NULL values seen
    count: i64,
    /// Sum value for SUM/AVG
    sum: Option<DataValue>,
    /// Current MIN or MAX
    extreme: Option<DataValue>,
    /// Values already folded in, for DISTINCT aggregates
    seen: Option<HashSet<DataValue>>,
}

impl Accumulator {
    pub(crate) fn new(spec: &AggregateSpec) -> Self {
        Accumulator {
            function: spec.function,
            count: 0,
            sum: None,
            extreme: None,
            seen: spec.distinct.then(HashSet::new),
        }
    }

    /// Fold one input in. `None` stands for a `COUNT(*)` row.
    pub(crate) fn update(&mut self, value: Option<DataValue>) -> QueryResult<()> {
        let Some(value) = value else {
            self.count += 1;
            return Ok(());
        };
        // NULL inputs are ignored by every aggregate over an expression
        if value.is_null() {
            return Ok(());
        }
        if let Some(seen) = &mut self.seen {
            if !seen.insert(value.clone()) {
                return Ok(());
            }
        }

        self.count += 1;
        match self.function {
            AggregateFunction::Count => {}
            AggregateFunction::Sum | AggregateFunction::Avg => self.update_sum(value)?,
            AggregateFunction::Min => self.update_extreme(value, Ordering::Less)?,
            AggregateFunction::Max => self.update_extreme(value, Ordering::Greater)?,
        }
        Ok(())
    }

    /// Update sum value
    fn update_sum(&mut self, value: DataValue) -> QueryResult<()> {
        let next = match (self.sum.take(), value) {
            (None, v @ (DataValue::Integer(_) | DataValue::Float(_))) => v,
            (Some(DataValue::Integer(sum)), DataValue::Integer(i)) => {
                DataValue::Integer(sum.checked_add(i).ok_or(QueryError::NumericOverflow)?)
            }
            (Some(DataValue::Integer(sum)), DataValue::Float(f)) => DataValue::Float(sum as f64 + f),
            (Some(DataValue::Float(sum)), DataValue::Integer(i)) => DataValue::Float(sum + i as f64),
            (Some(DataValue::Float(sum)), DataValue::Float(f)) => DataValue::Float(sum + f),
            (_, other) => {
                return Err(QueryError::TypeError(format!(
                    "{} requires numeric input, got {}",
                    self.function,
                    other.type_name()
                )));
            }
        };
        self.sum = Some(next);
        Ok(())
    }

    /// Keep `value` if it compares as `wanted` against the current extreme
    fn update_extreme(&mut self, value: DataValue, wanted: Ordering) -> QueryResult<()> {
        let replace = match &self.extreme {
            None => true,
            Some(current) => value.sql_compare(current)? == Some(wanted),
        };
        if replace {
            self.extreme = Some(value);
        }
        Ok(())
    }

    /// Get the final aggregate value
    pub(crate) fn result(&self) -> DataValue {
        match self.function {
            AggregateFunction::Count => DataValue::Integer(self.count),
            AggregateFunction::Sum => self.sum.clone().unwrap_or(DataValue::Null),
            AggregateFunction::Avg => match &self.sum {
                Some(DataValue::Integer(sum)) if self.count > 0 => DataValue::Float(*sum as f64 / self.count as f64),
                Some(DataValue::Float(sum)) if self.count > 0 => DataValue::Float(sum / self.count as f64),
                _ => DataValue::Null,
            },
            AggregateFunction::Min | AggregateFunction::Max => self.extreme.clone().unwrap_or(DataValue::Null),
        }
    }
}
