// Values Operator
//
// Yields rows that are already in memory. Used wherever an operator has to
// replay materialized rows through the iterator interface.

use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{QueryResult, Row};

/// In-memory row source
pub struct ValuesOperator {
    columns: Vec<String>,
    rows: Vec<Row>,
    position: usize,
}

impl ValuesOperator {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        ValuesOperator { columns, rows, position: 0 }
    }
}

impl Operator for ValuesOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.position = 0;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn close(&mut self) -> QueryResult<()> {
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }
}

/// Create a values operator
pub fn create_values(columns: Vec<String>, rows: Vec<Row>) -> OperatorRef {
    into_ref(ValuesOperator::new(columns, rows))
}
