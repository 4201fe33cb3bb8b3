// Row Store Implementation
//
// Owns every table: its schema and its ordered rows. Writes take the table's
// exclusive lock for their whole duration and are validated in full before
// anything is committed, so a failed write leaves the table untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;

use crate::catalog::{Column, Table, TypeValidator};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};

/// Shared handle to one stored table
pub type TableHandle = Arc<RwLock<StoredTable>>;

/// A table's schema together with its rows. Each row holds one value per
/// schema column, in schema order.
#[derive(Debug, Clone)]
pub struct StoredTable {
    schema: Table,
    rows: Vec<Vec<DataValue>>,
}

impl StoredTable {
    fn new(schema: Table) -> Self {
        StoredTable { schema, rows: Vec::new() }
    }

    pub fn schema(&self) -> &Table {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<DataValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names prefixed with `qualifier.`
    pub fn qualified_columns(&self, qualifier: &str) -> Vec<String> {
        self.schema
            .columns()
            .iter()
            .map(|c| format!("{}.{}", qualifier, c.name()))
            .collect()
    }

    /// Build a named row from positional values
    pub fn qualified_row(&self, values: &[DataValue], qualifier: &str) -> Row {
        Row::from_values(self.qualified_columns(qualifier), values.to_vec())
    }

    /// Every row, materialized with qualified column names
    pub fn snapshot(&self, qualifier: &str) -> Vec<Row> {
        let columns = self.qualified_columns(qualifier);
        self.rows
            .iter()
            .map(|values| Row::from_values(columns.clone(), values.clone()))
            .collect()
    }

    /// Fail if two of `rows` share a primary-key value
    fn check_primary_key(&self, rows: &[Vec<DataValue>]) -> QueryResult<()> {
        let key_indices = self.schema.primary_key_indices();
        if key_indices.is_empty() {
            return Ok(());
        }
        let mut seen: HashSet<Vec<&DataValue>> = HashSet::with_capacity(rows.len());
        for row in rows {
            let key: Vec<&DataValue> = key_indices.iter().map(|&i| &row[i]).collect();
            if let Some(null_at) = key_indices.iter().zip(&key).find(|(_, v)| v.is_null()) {
                return Err(QueryError::NotNullViolation(self.schema.columns()[*null_at.0].name().to_string()));
            }
            if !seen.insert(key.clone()) {
                let rendered: Vec<String> = key.iter().map(|v| v.to_sql_literal()).collect();
                return Err(QueryError::PrimaryKeyViolation {
                    table: self.schema.name().to_string(),
                    key: rendered.join(", "),
                });
            }
        }
        Ok(())
    }
}

/// Holds named tables; the single owner of all rows
#[derive(Debug, Default)]
pub struct RowStore {
    tables: RwLock<HashMap<String, TableHandle>>,
}

fn rejected(table: &str, operation: &str, err: QueryError) -> QueryError {
    warn!("{} on table {} rejected: {}", operation, table, err);
    err
}

impl RowStore {
    pub fn new() -> Self {
        RowStore::default()
    }

    /// Register a new, empty table
    pub fn create_table(&self, table: Table) -> QueryResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(table.name()) {
            return Err(QueryError::TableAlreadyExists(table.name().to_string()));
        }
        debug!("Creating table {}", table.name());
        tables.insert(table.name().to_string(), Arc::new(RwLock::new(StoredTable::new(table))));
        Ok(())
    }

    /// Remove a table with all of its rows
    pub fn drop_table(&self, name: &str) -> QueryResult<()> {
        let mut tables = self.tables.write();
        let handle = tables
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))?;
        // Wait out any write in flight before the table disappears
        let mut guard = handle.write();
        guard.rows.clear();
        tables.remove(name);
        debug!("Dropped table {}", name);
        Ok(())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Names of all tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Handle to a table
    pub fn table(&self, name: &str) -> QueryResult<TableHandle> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))
    }

    /// Copy of a table's schema
    pub fn schema(&self, name: &str) -> QueryResult<Table> {
        Ok(self.table(name)?.read().schema().clone())
    }

    /// Consistent snapshot of a table's rows, names qualified by `qualifier`
    pub fn scan(&self, name: &str, qualifier: &str) -> QueryResult<Vec<Row>> {
        let handle = self.table(name)?;
        let guard = handle.read();
        Ok(guard.snapshot(qualifier))
    }

    /// Append full positional rows. Either every row is inserted or none is.
    pub fn insert(&self, name: &str, rows: Vec<Vec<DataValue>>) -> QueryResult<usize> {
        let handle = self.table(name)?;
        let mut table = handle.write();

        let mut validated = Vec::with_capacity(rows.len());
        for values in &rows {
            let row = TypeValidator::validate_row(values, &table.schema)
                .map_err(|e| rejected(name, "INSERT", e.into()))?;
            validated.push(row);
        }

        if !table.schema.primary_key_indices().is_empty() {
            let mut combined = table.rows.clone();
            combined.extend(validated.iter().cloned());
            table.check_primary_key(&combined).map_err(|e| rejected(name, "INSERT", e))?;
        }

        let count = validated.len();
        table.rows.extend(validated);
        debug!("Inserted {} row(s) into {}", count, name);
        Ok(count)
    }

    /// Rewrite rows. `assign` sees each row (names qualified by the table
    /// name) and returns the `(column, value)` pairs to change, or `None` to
    /// leave the row alone. The whole batch is validated before committing.
    pub fn update_where<F>(&self, name: &str, mut assign: F) -> QueryResult<usize>
    where
        F: FnMut(&Row) -> QueryResult<Option<Vec<(String, DataValue)>>>,
    {
        let handle = self.table(name)?;
        let mut table = handle.write();

        let mut new_rows = table.rows.clone();
        let mut affected = 0;
        for values in new_rows.iter_mut() {
            let row = table.qualified_row(values, name);
            let Some(changes) = assign(&row)? else {
                continue;
            };
            for (column, value) in changes {
                let idx = table
                    .schema
                    .column_index(&column)
                    .ok_or_else(|| QueryError::ColumnNotFound(format!("{} in table {}", column, name)))?;
                values[idx] = value;
            }
            *values = TypeValidator::validate_row(values, &table.schema)
                .map_err(|e| rejected(name, "UPDATE", e.into()))?;
            affected += 1;
        }

        if affected > 0 {
            table.check_primary_key(&new_rows).map_err(|e| rejected(name, "UPDATE", e))?;
            table.rows = new_rows;
        }
        debug!("Updated {} row(s) in {}", affected, name);
        Ok(affected)
    }

    /// Remove every row for which `predicate` returns true
    pub fn delete_where<F>(&self, name: &str, mut predicate: F) -> QueryResult<usize>
    where
        F: FnMut(&Row) -> QueryResult<bool>,
    {
        let handle = self.table(name)?;
        let mut table = handle.write();

        // Decide for every row first so an evaluation error deletes nothing
        let mut keep = Vec::with_capacity(table.rows.len());
        for values in &table.rows {
            let row = table.qualified_row(values, name);
            keep.push(!predicate(&row)?);
        }

        let before = table.rows.len();
        let mut flags = keep.into_iter();
        table.rows.retain(|_| flags.next().unwrap_or(true));
        let deleted = before - table.rows.len();
        debug!("Deleted {} row(s) from {}", deleted, name);
        Ok(deleted)
    }

    /// Remove all rows, keeping the schema
    pub fn truncate(&self, name: &str) -> QueryResult<usize> {
        let handle = self.table(name)?;
        let mut table = handle.write();
        let removed = table.rows.len();
        table.rows.clear();
        debug!("Truncated {} ({} row(s))", name, removed);
        Ok(removed)
    }

    /// Append a column, filling existing rows with its default (or NULL)
    pub fn alter_add_column(&self, name: &str, column: Column) -> QueryResult<()> {
        let handle = self.table(name)?;
        let mut table = handle.write();

        let fill = match column.default_value() {
            Some(default) => TypeValidator::validate_value(default, &column)
                .map_err(|e| rejected(name, "ALTER TABLE ADD COLUMN", e.into()))?,
            None => DataValue::Null,
        };
        if fill.is_null() && !column.is_nullable() && !table.rows.is_empty() {
            return Err(rejected(
                name,
                "ALTER TABLE ADD COLUMN",
                QueryError::NotNullViolation(column.name().to_string()),
            ));
        }

        let mut schema = table.schema.clone();
        schema.add_column(column)?;
        let new_rows: Vec<Vec<DataValue>> = table
            .rows
            .iter()
            .map(|values| {
                let mut values = values.clone();
                values.push(fill.clone());
                values
            })
            .collect();

        let candidate = StoredTable { schema, rows: new_rows };
        candidate
            .check_primary_key(&candidate.rows)
            .map_err(|e| rejected(name, "ALTER TABLE ADD COLUMN", e))?;
        *table = candidate;
        debug!("Added column to {}", name);
        Ok(())
    }

    /// Remove a column from the schema and from every row
    pub fn alter_drop_column(&self, name: &str, column: &str) -> QueryResult<()> {
        let handle = self.table(name)?;
        let mut table = handle.write();

        let mut schema = table.schema.clone();
        let idx = schema.drop_column(column)?;
        for values in table.rows.iter_mut() {
            values.remove(idx);
        }
        table.schema = schema;
        debug!("Dropped column {} from {}", column, name);
        Ok(())
    }

    /// Rename a column; rows are positional so only the schema changes
    pub fn alter_rename_column(&self, name: &str, old: &str, new: &str) -> QueryResult<()> {
        let handle = self.table(name)?;
        let mut table = handle.write();
        table.schema.rename_column(old, new)
    }
}
