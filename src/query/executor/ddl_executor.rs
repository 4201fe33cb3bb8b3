// Data Definition Language Executor
//
// This module handles execution of DDL statements: CREATE TABLE, DROP TABLE
// and ALTER TABLE.

use std::sync::Arc;

use log::debug;

use crate::catalog::{Column, Table};
use crate::query::executor::result::{QueryError, QueryResult, QueryResultSet};
use crate::query::plan::AlterTableOperation;
use crate::storage::RowStore;

/// Handles execution of DDL operations
pub struct DdlExecutor {
    store: Arc<RowStore>,
}

impl DdlExecutor {
    pub fn new(store: Arc<RowStore>) -> Self {
        DdlExecutor { store }
    }

    pub fn execute_create(&self, name: &str, columns: Vec<Column>, primary_key: Vec<String>) -> QueryResult<QueryResultSet> {
        let table = Table::new(name, columns, primary_key)?;
        debug!("CREATE TABLE {}", table.schema_string());
        self.store.create_table(table)?;
        Ok(QueryResultSet::status(format!("Table '{}' created", name)))
    }

    pub fn execute_drop(&self, name: &str, if_exists: bool) -> QueryResult<QueryResultSet> {
        match self.store.drop_table(name) {
            Ok(()) => Ok(QueryResultSet::status(format!("Table '{}' dropped", name))),
            Err(QueryError::TableNotFound(_)) if if_exists => {
                Ok(QueryResultSet::status(format!("Table '{}' does not exist, skipped", name)))
            }
            Err(e) => Err(e),
        }
    }

    pub fn execute_alter(&self, table: &str, operation: AlterTableOperation) -> QueryResult<QueryResultSet> {
        match operation {
            AlterTableOperation::AddColumn(column) => {
                let column_name = column.name().to_string();
                self.store.alter_add_column(table, column)?;
                Ok(QueryResultSet::status(format!(
                    "Column '{}' added to table '{}'",
                    column_name, table
                )))
            }
            AlterTableOperation::DropColumn(column) => {
                self.store.alter_drop_column(table, &column)?;
                Ok(QueryResultSet::status(format!(
                    "Column '{}' dropped from table '{}'",
                    column, table
                )))
            }
            AlterTableOperation::RenameColumn { old, new } => {
                self.store.alter_rename_column(table, &old, &new)?;
                Ok(QueryResultSet::status(format!(
                    "Column '{}' renamed to '{}' in table '{}'",
                    old, new, table
                )))
            }
        }
    }
}
