// Nested Loop Join Implementation
//
// The outer input is streamed; the inner input is materialized once at init
// and rescanned for every outer row. Output preserves outer order, then
// inner order.

use log::trace;

use super::LoopMode;
use crate::config::EngineConfig;
use crate::query::executor::expression_eval::{evaluate_predicate, RowContext};
use crate::query::executor::operators::{Operator, OperatorRef};
use crate::query::executor::result::{QueryResult, Row};
use crate::query::plan::Expression;

/// Nested Loop Join operator implementation
pub struct NestedLoopJoin {
    /// Outer input operator
    outer: OperatorRef,
    /// Inner input operator
    inner: OperatorRef,
    /// Join condition; `None` joins every pair
    condition: Option<Expression>,
    mode: LoopMode,
    /// Inputs were swapped: the inner side's columns come first in output
    swapped: bool,
    config: EngineConfig,
    /// Inner rows, materialized at init
    inner_rows: Vec<Row>,
    /// Inner column names, used for NULL padding
    inner_columns: Vec<String>,
    /// Current outer row being processed
    current_outer: Option<Row>,
    /// Next inner row to test against the current outer row
    inner_index: usize,
    /// Flag indicating if we've matched the current outer row
    found_match: bool,
    /// Initialization status
    initialized: bool,
}

impl NestedLoopJoin {
    pub(crate) fn new(
        outer: OperatorRef,
        inner: OperatorRef,
        condition: Option<Expression>,
        mode: LoopMode,
        swapped: bool,
        config: EngineConfig,
    ) -> Self {
        NestedLoopJoin {
            outer,
            inner,
            condition,
            mode,
            swapped,
            config,
            inner_rows: Vec::new(),
            inner_columns: Vec::new(),
            current_outer: None,
            inner_index: 0,
            found_match: false,
            initialized: false,
        }
    }

    /// Combine an outer and an inner row, original left side first
    fn combine(&self, outer: &Row, inner: &Row) -> Row {
        if self.swapped {
            Row::merge(inner, outer)
        } else {
            Row::merge(outer, inner)
        }
    }

    fn matches(&self, outer: &Row, inner: &Row) -> QueryResult<bool> {
        let Some(condition) = &self.condition else {
            return Ok(true);
        };
        let truth = evaluate_predicate(condition, &RowContext::pair(outer, inner), &self.config)?;
        trace!("join {} -> {}", condition, truth);
        Ok(truth.is_true())
    }

    fn advance_outer(&mut self) -> QueryResult<()> {
        self.current_outer = self.outer.lock().next()?;
        self.inner_index = 0;
        self.found_match = false;
        Ok(())
    }
}

impl Operator for NestedLoopJoin {
    fn init(&mut self) -> QueryResult<()> {
        {
            let mut inner = self.inner.lock();
            inner.init()?;
            self.inner_columns = inner.columns();
            self.inner_rows.clear();
            while let Some(row) = inner.next()? {
                self.inner_rows.push(row);
            }
            inner.close()?;
        }

        self.outer.lock().init()?;
        self.initialized = true;
        self.advance_outer()
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }

        while let Some(outer) = self.current_outer.take() {
            while self.inner_index < self.inner_rows.len() {
                let inner = &self.inner_rows[self.inner_index];
                self.inner_index += 1;
                if self.mode == LoopMode::Cross || self.matches(&outer, inner)? {
                    self.found_match = true;
                    if self.mode == LoopMode::Anti {
                        // One match disqualifies the outer row
                        break;
                    }
                    let joined = self.combine(&outer, inner);
                    self.current_outer = Some(outer);
                    return Ok(Some(joined));
                }
            }

            let pad = match self.mode {
                LoopMode::Outer | LoopMode::Anti => !self.found_match,
                LoopMode::Matches | LoopMode::Cross => false,
            };
            self.advance_outer()?;
            if pad {
                let nulls = Row::nulls(&self.inner_columns);
                return Ok(Some(self.combine(&outer, &nulls)));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.outer.lock().close()?;
        self.inner_rows.clear();
        self.current_outer = None;
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        let outer = self.outer.lock().columns();
        let inner = self.inner.lock().columns();
        if self.swapped {
            inner.into_iter().chain(outer).collect()
        } else {
            outer.into_iter().chain(inner).collect()
        }
    }
}
