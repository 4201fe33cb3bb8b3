// Full Outer Join
//
// FULL JOIN is computed as the duplicate-eliminating union of the LEFT and
// the RIGHT join of the same inputs. Duplicates are whole-row duplicates,
// so two identical rows already present in one side collapse as well.

use std::collections::HashSet;

use log::debug;

use super::{LoopMode, NestedLoopJoin};
use crate::config::EngineConfig;
use crate::query::executor::operators::values::create_values;
use crate::query::executor::operators::{collect_rows, into_ref, Operator, OperatorRef};
use crate::query::executor::result::{QueryResult, Row};
use crate::query::plan::Expression;

/// Concatenate two row sequences dropping rows equal to one seen earlier
pub fn union_distinct(first: Vec<Row>, second: Vec<Row>) -> Vec<Row> {
    let mut seen = HashSet::with_capacity(first.len() + second.len());
    let mut result = Vec::new();
    for row in first.into_iter().chain(second) {
        if seen.insert(row.clone()) {
            result.push(row);
        }
    }
    result
}

/// Full outer join operator
pub struct FullOuterJoin {
    left: OperatorRef,
    right: OperatorRef,
    condition: Option<Expression>,
    config: EngineConfig,
    result: std::vec::IntoIter<Row>,
    initialized: bool,
}

impl FullOuterJoin {
    pub fn new(left: OperatorRef, right: OperatorRef, condition: Option<Expression>, config: EngineConfig) -> Self {
        FullOuterJoin {
            left,
            right,
            condition,
            config,
            result: Vec::new().into_iter(),
            initialized: false,
        }
    }
}

impl Operator for FullOuterJoin {
    fn init(&mut self) -> QueryResult<()> {
        // Both passes read each input, so materialize them once
        let left_columns = self.left.lock().columns();
        let right_columns = self.right.lock().columns();
        let left_rows = collect_rows(&self.left)?;
        let right_rows = collect_rows(&self.right)?;

        let pass = |outer_is_left: bool| -> QueryResult<Vec<Row>> {
            let left = create_values(left_columns.clone(), left_rows.clone());
            let right = create_values(right_columns.clone(), right_rows.clone());
            let (outer, inner) = if outer_is_left { (left, right) } else { (right, left) };
            let join = into_ref(NestedLoopJoin::new(
                outer,
                inner,
                self.condition.clone(),
                LoopMode::Outer,
                !outer_is_left,
                self.config.clone(),
            ));
            collect_rows(&join)
        };

        let left_join = pass(true)?;
        let right_join = pass(false)?;
        let (l, r) = (left_join.len(), right_join.len());
        let rows = union_distinct(left_join, right_join);
        debug!("Full join: {} left-join row(s) + {} right-join row(s) -> {}", l, r, rows.len());

        self.result = rows.into_iter();
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }
        Ok(self.result.next())
    }

    fn close(&mut self) -> QueryResult<()> {
        self.result = Vec::new().into_iter();
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        let mut columns = self.left.lock().columns();
        columns.extend(self.right.lock().columns());
        columns
    }
}
