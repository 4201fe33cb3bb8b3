// Filter Operator Implementation
//
// This module implements the filter operator for filtering rows based on
// predicates. A row passes only when the predicate is exactly TRUE.

use log::trace;

use crate::config::EngineConfig;
use crate::query::executor::expression_eval::{evaluate_predicate, RowContext};
use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{QueryResult, Row};
use crate::query::plan::Expression;

/// Filter operator that filters rows based on a predicate
pub struct FilterOperator {
    /// The input operator
    input: OperatorRef,
    /// The predicate to evaluate
    predicate: Expression,
    config: EngineConfig,
    /// Whether the operator is initialized
    initialized: bool,
}

impl FilterOperator {
    /// Create a new filter operator
    pub fn new(input: OperatorRef, predicate: Expression, config: EngineConfig) -> Self {
        FilterOperator {
            input,
            predicate,
            config,
            initialized: false,
        }
    }
}

impl Operator for FilterOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.lock().init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }

        let mut input = self.input.lock();
        while let Some(row) = input.next()? {
            let truth = evaluate_predicate(&self.predicate, &RowContext::single(&row), &self.config)?;
            trace!("filter {} -> {}", self.predicate, truth);
            if truth.is_true() {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.input.lock().close()?;
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        self.input.lock().columns()
    }
}

/// Create a filter operator
pub fn create_filter(input: OperatorRef, predicate: Expression, config: EngineConfig) -> OperatorRef {
    into_ref(FilterOperator::new(input, predicate, config))
}
