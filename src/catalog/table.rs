//! Table Management Module
//!
//! This module defines the Table type that represents a table schema:
//! its ordered columns and its primary-key constraint.

use std::collections::{HashMap, HashSet};

use super::column::Column;
use crate::query::executor::result::{QueryError, QueryResult};

/// Represents a database table schema
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name
    name: String,
    /// Columns in the table
    columns: Vec<Column>,
    /// Column name to index lookup
    column_map: HashMap<String, usize>,
    /// Primary key column indices, in constraint order
    primary_key_columns: Vec<usize>,
}

impl Table {
    /// Create a table schema.
    ///
    /// `primary_key` lists table-level key columns; columns flagged as primary
    /// key on their own definition are merged in after them. Fails with a
    /// schema error on duplicate column names or on a key column that is
    /// missing or listed twice.
    pub fn new(name: impl Into<String>, columns: Vec<Column>, primary_key: Vec<String>) -> QueryResult<Self> {
        let name = name.into();
        if columns.is_empty() {
            return Err(QueryError::SchemaError(format!("Table {} must have at least one column", name)));
        }

        let mut column_map = HashMap::new();
        for (i, col) in columns.iter().enumerate() {
            if column_map.insert(col.name().to_string(), i).is_some() {
                return Err(QueryError::DuplicateColumn(format!("{} in table {}", col.name(), name)));
            }
        }

        let mut seen = HashSet::new();
        let mut primary_key_columns = Vec::new();
        for key in &primary_key {
            let idx = *column_map.get(key).ok_or_else(|| {
                QueryError::SchemaError(format!("Primary key column {} does not exist in table {}", key, name))
            })?;
            if !seen.insert(idx) {
                return Err(QueryError::SchemaError(format!(
                    "Primary key column {} is listed more than once in table {}",
                    key, name
                )));
            }
            primary_key_columns.push(idx);
        }
        for (i, col) in columns.iter().enumerate() {
            if col.is_primary_key() && seen.insert(i) {
                primary_key_columns.push(i);
            }
        }

        let mut columns = columns;
        for &idx in &primary_key_columns {
            columns[idx].mark_primary_key();
        }

        Ok(Table {
            name,
            columns,
            column_map,
            primary_key_columns,
        })
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.column_map.get(name).map(|&idx| &self.columns[idx])
    }

    /// Check if the table has a column with the given name
    pub fn has_column(&self, name: &str) -> bool {
        self.column_map.contains_key(name)
    }

    /// Get the column index for a column name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_map.get(name).copied()
    }

    /// Positions of the primary key columns
    pub fn primary_key_indices(&self) -> &[usize] {
        &self.primary_key_columns
    }

    /// Get primary key columns
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_key_columns.iter().map(|&idx| &self.columns[idx]).collect()
    }

    /// Add a column to the end of the table
    pub(crate) fn add_column(&mut self, column: Column) -> QueryResult<()> {
        let col_name = column.name().to_string();
        if self.has_column(&col_name) {
            return Err(QueryError::DuplicateColumn(format!("{} in table {}", col_name, self.name)));
        }
        let idx = self.columns.len();
        let is_key = column.is_primary_key();
        self.columns.push(column);
        self.column_map.insert(col_name, idx);
        if is_key {
            self.primary_key_columns.push(idx);
        }
        Ok(())
    }

    /// Drop a column from the table, returning its former position
    pub(crate) fn drop_column(&mut self, column_name: &str) -> QueryResult<usize> {
        let idx = self.column_index(column_name).ok_or_else(|| {
            QueryError::ColumnNotFound(format!("{} in table {}", column_name, self.name))
        })?;
        if self.columns.len() == 1 {
            return Err(QueryError::SchemaError(format!(
                "Cannot drop the last column '{}' from table '{}'. Use DROP TABLE instead.",
                column_name, self.name
            )));
        }
        if self.columns[idx].is_primary_key() {
            return Err(QueryError::SchemaError(format!(
                "Cannot drop primary key column '{}' from table '{}'",
                column_name, self.name
            )));
        }
        self.columns.remove(idx);
        self.rebuild_maps();
        Ok(idx)
    }

    /// Rename a column in the table
    pub(crate) fn rename_column(&mut self, old_name: &str, new_name: &str) -> QueryResult<()> {
        let idx = self.column_index(old_name).ok_or_else(|| {
            QueryError::ColumnNotFound(format!("{} in table {}", old_name, self.name))
        })?;
        if self.has_column(new_name) {
            return Err(QueryError::DuplicateColumn(format!("{} in table {}", new_name, self.name)));
        }
        self.columns[idx].rename(new_name);
        self.column_map.remove(old_name);
        self.column_map.insert(new_name.to_string(), idx);
        Ok(())
    }

    fn rebuild_maps(&mut self) {
        self.column_map.clear();
        self.primary_key_columns.clear();
        for (i, col) in self.columns.iter().enumerate() {
            self.column_map.insert(col.name().to_string(), i);
            if col.is_primary_key() {
                self.primary_key_columns.push(i);
            }
        }
    }

    /// Get a string representation of the table schema
    pub fn schema_string(&self) -> String {
        let mut schema = format!("CREATE TABLE {} (\n", self.name);
        let mut lines: Vec<String> = self.columns
            .iter()
            .map(|col| {
                let mut line = format!("  {} {}", col.name(), col.data_type());
                if !col.is_nullable() {
                    line.push_str(" NOT NULL");
                }
                if let Some(default) = col.default_value() {
                    line.push_str(&format!(" DEFAULT {}", default.to_sql_literal()));
                }
                line
            })
            .collect();
        if !self.primary_key_columns.is_empty() {
            let keys: Vec<&str> = self.primary_key_columns.iter().map(|&i| self.columns[i].name()).collect();
            lines.push(format!("  PRIMARY KEY ({})", keys.join(", ")));
        }
        schema.push_str(&lines.join(",\n"));
        schema.push_str("\n);");
        schema
    }
}
