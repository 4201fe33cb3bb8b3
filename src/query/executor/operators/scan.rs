// Table Scan Operator
//
// Reads a consistent snapshot of one table from the row store. The snapshot
// is taken under the table's shared lock when the operator is initialized,
// so a concurrent write is either fully visible or not at all.

use std::sync::Arc;

use log::debug;

use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{QueryResult, Row};
use crate::storage::{RowStore, TableHandle};

/// A table scan operator that yields every row of a table
pub struct TableScanOperator {
    /// Table name to scan
    table_name: String,
    /// Qualifier for output column names (alias or table name)
    qualifier: String,
    /// The stored table
    table: TableHandle,
    /// Output column names, fixed when the operator is built
    columns: Vec<String>,
    /// Rows captured by `init`
    rows: Vec<Row>,
    /// Position of the next row
    position: usize,
    /// Initialization status
    initialized: bool,
}

impl TableScanOperator {
    /// Create a new table scan operator
    pub fn new(store: &RowStore, table_name: &str, alias: Option<&str>) -> QueryResult<Self> {
        let table = store.table(table_name)?;
        let qualifier = alias.unwrap_or(table_name).to_string();
        let columns = table.read().qualified_columns(&qualifier);
        Ok(TableScanOperator {
            table_name: table_name.to_string(),
            qualifier,
            table,
            columns,
            rows: Vec::new(),
            position: 0,
            initialized: false,
        })
    }
}

impl Operator for TableScanOperator {
    fn init(&mut self) -> QueryResult<()> {
        let table = self.table.read();
        self.rows = table.snapshot(&self.qualifier);
        self.columns = table.qualified_columns(&self.qualifier);
        self.position = 0;
        self.initialized = true;
        debug!("Scanning {} as {}: {} row(s)", self.table_name, self.qualifier, self.rows.len());
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }
        if self.position >= self.rows.len() {
            return Ok(None);
        }
        let row = std::mem::take(&mut self.rows[self.position]);
        self.position += 1;
        Ok(Some(row))
    }

    fn close(&mut self) -> QueryResult<()> {
        self.rows.clear();
        self.position = 0;
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }
}

/// Create a table scan operator
pub fn create_table_scan(store: &Arc<RowStore>, table_name: &str, alias: Option<&str>) -> QueryResult<OperatorRef> {
    Ok(into_ref(TableScanOperator::new(store, table_name, alias)?))
}
