// Data Manipulation Language Executor
//
// This module handles execution of DML statements: INSERT, UPDATE, DELETE
// and TRUNCATE. Every statement is applied atomically by the row store.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::config::EngineConfig;
use crate::query::executor::expression_eval::{evaluate_expression, evaluate_predicate, RowContext};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, QueryResultSet, Row};
use crate::query::plan::{Assignment, Expression};
use crate::storage::RowStore;

/// Handles execution of DML operations
pub struct DmlExecutor {
    store: Arc<RowStore>,
    config: EngineConfig,
}

impl DmlExecutor {
    pub fn new(store: Arc<RowStore>, config: EngineConfig) -> Self {
        DmlExecutor { store, config }
    }

    /// Evaluate the rows of a `VALUES` list; expressions see no columns
    pub fn evaluate_values(&self, rows: &[Vec<Expression>]) -> QueryResult<Vec<Vec<DataValue>>> {
        let empty = Row::new();
        let ctx = RowContext::single(&empty);
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|expr| evaluate_expression(expr, &ctx, &self.config))
                    .collect::<QueryResult<Vec<_>>>()
            })
            .collect()
    }

    /// Insert rows. With an explicit column list, values are placed by name
    /// and the remaining columns take their default or NULL.
    pub fn execute_insert(
        &self,
        table: &str,
        columns: Option<&[String]>,
        rows: Vec<Vec<DataValue>>,
    ) -> QueryResult<QueryResultSet> {
        let rows = match columns {
            None => rows,
            Some(columns) => self.expand_rows(table, columns, rows)?,
        };
        let count = self.store.insert(table, rows)?;
        Ok(QueryResultSet::rows_affected(count))
    }

    /// Map rows given for `columns` onto full positional table rows
    fn expand_rows(&self, table: &str, columns: &[String], rows: Vec<Vec<DataValue>>) -> QueryResult<Vec<Vec<DataValue>>> {
        let schema = self.store.schema(table)?;

        let mut positions = Vec::with_capacity(columns.len());
        let mut named = HashSet::new();
        for column in columns {
            let index = schema
                .column_index(column)
                .ok_or_else(|| QueryError::ColumnNotFound(format!("{} in table {}", column, table)))?;
            if !named.insert(index) {
                return Err(QueryError::ValidationError(format!("Column {} listed twice in INSERT", column)));
            }
            positions.push(index);
        }

        let template: Vec<DataValue> = schema
            .columns()
            .iter()
            .map(|c| c.default_value().cloned().unwrap_or(DataValue::Null))
            .collect();

        rows.into_iter()
            .map(|values| {
                if values.len() != positions.len() {
                    return Err(QueryError::ValidationError(format!(
                        "INSERT has {} column(s) but {} value(s)",
                        positions.len(),
                        values.len()
                    )));
                }
                let mut full = template.clone();
                for (index, value) in positions.iter().zip(values) {
                    full[*index] = value;
                }
                Ok(full)
            })
            .collect()
    }

    /// Apply `assignments` to every row where `predicate` is TRUE. Assigned
    /// expressions see the row as it was before the statement.
    pub fn execute_update(
        &self,
        table: &str,
        assignments: &[Assignment],
        predicate: Option<&Expression>,
    ) -> QueryResult<QueryResultSet> {
        let schema = self.store.schema(table)?;
        let mut assigned = HashSet::new();
        for assignment in assignments {
            if !schema.has_column(&assignment.column) {
                return Err(QueryError::ColumnNotFound(format!("{} in table {}", assignment.column, table)));
            }
            if !assigned.insert(assignment.column.as_str()) {
                return Err(QueryError::ValidationError(format!(
                    "Column {} assigned twice in UPDATE",
                    assignment.column
                )));
            }
        }

        let config = &self.config;
        let count = self.store.update_where(table, |row| {
            let ctx = RowContext::single(row);
            if let Some(predicate) = predicate {
                if !evaluate_predicate(predicate, &ctx, config)?.is_true() {
                    return Ok(None);
                }
            }
            let changes = assignments
                .iter()
                .map(|a| Ok((a.column.clone(), evaluate_expression(&a.value, &ctx, config)?)))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(Some(changes))
        })?;
        debug!("UPDATE {}: {} row(s)", table, count);
        Ok(QueryResultSet::rows_affected(count))
    }

    /// Delete the rows where `predicate` is TRUE; all rows without one
    pub fn execute_delete(&self, table: &str, predicate: Option<&Expression>) -> QueryResult<QueryResultSet> {
        let config = &self.config;
        let count = self.store.delete_where(table, |row| match predicate {
            Some(predicate) => Ok(evaluate_predicate(predicate, &RowContext::single(row), config)?.is_true()),
            None => Ok(true),
        })?;
        Ok(QueryResultSet::rows_affected(count))
    }

    pub fn execute_truncate(&self, table: &str) -> QueryResult<QueryResultSet> {
        let count = self.store.truncate(table)?;
        Ok(QueryResultSet::rows_affected(count))
    }
}
