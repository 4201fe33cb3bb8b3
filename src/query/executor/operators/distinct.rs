// Distinct Operator
//
// Drops rows whose key equals the key of an earlier row. The key is the
// evaluated projection, or the whole row when no key expressions are given.

use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::query::executor::expression_eval::{evaluate_expression, RowContext};
use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{DataValue, QueryResult, Row};
use crate::query::plan::Expression;

pub struct DistinctOperator {
    input: OperatorRef,
    keys: Vec<Expression>,
    config: EngineConfig,
    seen: HashSet<Vec<DataValue>>,
    initialized: bool,
}

impl DistinctOperator {
    pub fn new(input: OperatorRef, keys: Vec<Expression>, config: EngineConfig) -> Self {
        DistinctOperator {
            input,
            keys,
            config,
            seen: HashSet::new(),
            initialized: false,
        }
    }

    fn key(&self, row: &Row) -> QueryResult<Vec<DataValue>> {
        if self.keys.is_empty() {
            return Ok(row.values().cloned().collect());
        }
        let ctx = RowContext::single(row);
        self.keys
            .iter()
            .map(|expr| evaluate_expression(expr, &ctx, &self.config))
            .collect()
    }
}

impl Operator for DistinctOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.lock().init()?;
        self.seen.clear();
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }
        loop {
            let Some(row) = self.input.lock().next()? else {
                return Ok(None);
            };
            let key = self.key(&row)?;
            if self.seen.insert(key) {
                return Ok(Some(row));
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.input.lock().close()?;
        self.seen.clear();
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        self.input.lock().columns()
    }
}

/// Create a distinct operator
pub fn create_distinct(input: OperatorRef, keys: Vec<Expression>, config: EngineConfig) -> OperatorRef {
    into_ref(DistinctOperator::new(input, keys, config))
}
