// Limit Operator
//
// Skips `offset` rows, then passes on at most `count` rows.

use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{QueryError, QueryResult, Row};

pub struct LimitOperator {
    input: OperatorRef,
    count: usize,
    offset: usize,
    emitted: usize,
    initialized: bool,
}

impl LimitOperator {
    pub fn new(input: OperatorRef, count: usize, offset: usize) -> Self {
        LimitOperator {
            input,
            count,
            offset,
            emitted: 0,
            initialized: false,
        }
    }
}

impl Operator for LimitOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.lock().init()?;
        self.emitted = 0;
        self.initialized = true;

        let mut input = self.input.lock();
        for _ in 0..self.offset {
            if input.next()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }
        // Stop pulling once the limit is reached
        if self.emitted >= self.count {
            return Ok(None);
        }
        let row = self.input.lock().next()?;
        if row.is_some() {
            self.emitted += 1;
        }
        Ok(row)
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

/// Create a limit operator. Negative values are rejected.
pub fn create_limit(input: OperatorRef, count: i64, offset: i64) -> QueryResult<OperatorRef> {
    if count < 0 {
        return Err(QueryError::InvalidLimit(format!("LIMIT must not be negative, got {}", count)));
    }
    if offset < 0 {
        return Err(QueryError::InvalidLimit(format!("OFFSET must not be negative, got {}", offset)));
    }
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    Ok(into_ref(LimitOperator::new(input, count, offset)))
}
