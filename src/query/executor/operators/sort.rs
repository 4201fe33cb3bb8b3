// Sort Operator
//
// Materializes its input and sorts it by the ORDER BY keys. The sort is
// stable, so rows with equal keys keep their input order.

use std::cmp::Ordering;

use log::debug;

use crate::config::EngineConfig;
use crate::query::executor::expression_eval::{evaluate_expression, RowContext};
use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};
use crate::query::plan::OrderByItem;

pub struct SortOperator {
    input: OperatorRef,
    order_by: Vec<OrderByItem>,
    config: EngineConfig,
    output: std::vec::IntoIter<Row>,
    initialized: bool,
}

impl SortOperator {
    pub fn new(input: OperatorRef, order_by: Vec<OrderByItem>, config: EngineConfig) -> Self {
        SortOperator {
            input,
            order_by,
            config,
            output: Vec::new().into_iter(),
            initialized: false,
        }
    }
}

/// Compare two sort key values. NULL placement follows `nulls_first` for
/// ascending keys and is mirrored for descending ones.
pub(crate) fn compare_sort_keys(
    a: &DataValue,
    b: &DataValue,
    descending: bool,
    nulls_first: bool,
) -> QueryResult<Ordering> {
    let null_first = nulls_first != descending;
    match (a.is_null(), b.is_null()) {
        (true, true) => Ok(Ordering::Equal),
        (true, false) => Ok(if null_first { Ordering::Less } else { Ordering::Greater }),
        (false, true) => Ok(if null_first { Ordering::Greater } else { Ordering::Less }),
        (false, false) => {
            let ordering = a.compare(b)?;
            Ok(if descending { ordering.reverse() } else { ordering })
        }
    }
}

impl Operator for SortOperator {
    fn init(&mut self) -> QueryResult<()> {
        let mut rows = Vec::new();
        {
            let mut input = self.input.lock();
            input.init()?;
            while let Some(row) = input.next()? {
                rows.push(row);
            }
            input.close()?;
        }

        // Evaluate every key once up front
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            let ctx = RowContext::single(&row);
            let keys = self
                .order_by
                .iter()
                .map(|item| evaluate_expression(&item.expr, &ctx, &self.config))
                .collect::<QueryResult<Vec<_>>>()?;
            keyed.push((keys, row));
        }

        let mut failure: Option<QueryError> = None;
        keyed.sort_by(|(a, _), (b, _)| {
            for ((x, y), item) in a.iter().zip(b).zip(&self.order_by) {
                match compare_sort_keys(x, y, item.descending, self.config.nulls_first) {
                    Ok(Ordering::Equal) => continue,
                    Ok(ordering) => return ordering,
                    Err(e) => {
                        failure.get_or_insert(e);
                        return Ordering::Equal;
                    }
                }
            }
            Ordering::Equal
        });
        if let Some(e) = failure {
            return Err(e);
        }

        debug!("Sorted {} row(s) on {} key(s)", keyed.len(), self.order_by.len());
        self.output = keyed.into_iter().map(|(_, row)| row).collect::<Vec<_>>().into_iter();
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }
        Ok(self.output.next())
    }

    fn close(&mut self) -> QueryResult<()> {
        self.output = Vec::new().into_iter();
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        self.input.lock().columns()
    }
}

/// Create a sort operator
pub fn create_sort(input: OperatorRef, order_by: Vec<OrderByItem>, config: EngineConfig) -> OperatorRef {
    into_ref(SortOperator::new(input, order_by, config))
}
