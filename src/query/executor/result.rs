// Query Result Implementation
//
// This module defines the value, row, error and result-set types shared by
// the row store and the query executor.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DataType;

/// Date literal format accepted when coercing text into a date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Possible data types for values in a row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => true,
            (DataValue::Integer(a), DataValue::Integer(b)) => a == b,
            // Bitwise equality keeps Eq and Hash consistent for floats
            (DataValue::Float(a), DataValue::Float(b)) => a.total_cmp(b) == Ordering::Equal,
            (DataValue::Text(a), DataValue::Text(b)) => a == b,
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a == b,
            (DataValue::Date(a), DataValue::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DataValue {}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            DataValue::Null => {}
            DataValue::Integer(i) => i.hash(state),
            DataValue::Float(f) => f.to_bits().hash(state),
            DataValue::Text(s) => s.hash(state),
            DataValue::Boolean(b) => b.hash(state),
            DataValue::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "NULL"),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Text(s) => write!(f, "{}", s),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Integer(value as i64)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<NaiveDate> for DataValue {
    fn from(value: NaiveDate) -> Self {
        DataValue::Date(value)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DataValue::Null)
    }
}

impl DataValue {
    /// Parse a `YYYY-MM-DD` literal into a date value
    pub fn date(text: &str) -> QueryResult<DataValue> {
        parse_date(text).map(DataValue::Date)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Name of the runtime type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Null => "NULL",
            DataValue::Integer(_) => "INTEGER",
            DataValue::Float(_) => "FLOAT",
            DataValue::Text(_) => "TEXT",
            DataValue::Boolean(_) => "BOOLEAN",
            DataValue::Date(_) => "DATE",
        }
    }

    /// SQL comparison. Returns `None` when either side is NULL, an error when
    /// the two types cannot be compared at all.
    pub fn sql_compare(&self, other: &Self) -> QueryResult<Option<Ordering>> {
        let ordering = match (self, other) {
            (DataValue::Null, _) | (_, DataValue::Null) => return Ok(None),
            (DataValue::Integer(a), DataValue::Integer(b)) => a.cmp(b),
            (DataValue::Float(a), DataValue::Float(b)) => float_cmp(*a, *b),
            (DataValue::Integer(a), DataValue::Float(b)) => float_cmp(*a as f64, *b),
            (DataValue::Float(a), DataValue::Integer(b)) => float_cmp(*a, *b as f64),
            (DataValue::Text(a), DataValue::Text(b)) => a.cmp(b),
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a.cmp(b),
            (DataValue::Date(a), DataValue::Date(b)) => a.cmp(b),
            // Text compared against a date is read as a date literal
            (DataValue::Date(a), DataValue::Text(b)) => a.cmp(&parse_date(b)?),
            (DataValue::Text(a), DataValue::Date(b)) => parse_date(a)?.cmp(b),
            (a, b) => {
                return Err(QueryError::TypeError(format!(
                    "Cannot compare {} with {}",
                    a.type_name(),
                    b.type_name()
                )));
            }
        };
        Ok(Some(ordering))
    }

    /// Compare two DataValues for sorting purposes.
    /// NULLs compare equal to each other and less than any non-NULL value.
    pub fn compare(&self, other: &Self) -> QueryResult<Ordering> {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => Ok(Ordering::Equal),
            (DataValue::Null, _) => Ok(Ordering::Less),
            (_, DataValue::Null) => Ok(Ordering::Greater),
            (a, b) => Ok(a.sql_compare(b)?.unwrap_or(Ordering::Equal)),
        }
    }

    pub fn to_sql_literal(&self) -> String {
        match self {
            DataValue::Null => "NULL".to_string(),
            DataValue::Integer(i) => i.to_string(),
            DataValue::Float(f) => f.to_string(),
            DataValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            DataValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            DataValue::Date(d) => format!("DATE '{}'", d.format(DATE_FORMAT)),
        }
    }
}

/// Numeric comparison: `0.0 = -0.0`; NaN falls back to the total order
fn float_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

fn parse_date(text: &str) -> QueryResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| QueryError::TypeError(format!("Invalid date literal '{}': {}", text, e)))
}

/// Represents a row: an ordered mapping from column name to value
#[derive(Debug, Clone, Default)]
pub struct Row {
    values: LinkedHashMap<String, DataValue>,
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len() && self.values.iter().eq(other.values.iter())
    }
}

impl Eq for Row {}

impl Hash for Row {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (column, value) in self.values.iter() {
            column.hash(state);
            value.hash(state);
        }
    }
}

impl Row {
    /// Create a new empty row
    pub fn new() -> Self {
        Row { values: LinkedHashMap::new() }
    }

    /// Create a row from column values
    pub fn from_values(columns: Vec<String>, values: Vec<DataValue>) -> Self {
        let mut row = Row::new();
        for (col, val) in columns.into_iter().zip(values) {
            row.values.insert(col, val);
        }
        row
    }

    /// Concatenate two rows, left columns first
    pub fn merge(left: &Row, right: &Row) -> Self {
        let mut row = left.clone();
        for (column, value) in right.values.iter() {
            row.values.insert(column.clone(), value.clone());
        }
        row
    }

    /// A row with every listed column set to NULL
    pub fn nulls(columns: &[String]) -> Self {
        let mut row = Row::new();
        for column in columns {
            row.values.insert(column.clone(), DataValue::Null);
        }
        row
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&DataValue> {
        self.values.get(column)
    }

    /// Set a value for a column. New columns are appended.
    pub fn set(&mut self, column: String, value: DataValue) {
        match self.values.get_mut(&column) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(column, value);
            }
        }
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &DataValue> {
        self.values.values()
    }

    /// (name, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The error categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Duplicate or missing table/column definitions, invalid constraints
    Schema,
    /// Primary-key, NOT NULL or length violations on write
    Constraint,
    /// Malformed query plans and type errors
    Validation,
    /// References to tables or columns that do not exist
    NotFound,
}

/// Represents query execution error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),
    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    /// Table already exists
    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),
    /// Duplicate column
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),
    /// Invalid schema or constraint definition
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// Two rows would share a primary-key value
    #[error("Primary key violation on table {table}: duplicate key ({key})")]
    PrimaryKeyViolation { table: String, key: String },
    /// NULL written into a NOT NULL column
    #[error("NOT NULL violation: column {0} cannot be NULL")]
    NotNullViolation(String),
    /// Text longer than the declared VARCHAR length
    #[error("Value too long for column {column}: {actual} characters exceeds VARCHAR({max})")]
    ValueTooLong { column: String, max: usize, actual: usize },
    /// Malformed query plan
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Error in data type conversion or comparison
    #[error("Type error: {0}")]
    TypeError(String),
    /// Negative LIMIT or OFFSET
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
    /// Unqualified column name matching more than one input column
    #[error("Ambiguous column reference: {0}")]
    AmbiguousColumn(String),
    /// Error during query execution
    #[error("Execution error: {0}")]
    ExecutionError(String),
    /// Numeric overflow
    #[error("Numeric overflow")]
    NumericOverflow,
    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
}

impl QueryError {
    /// Map the error onto its caller-facing category
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::TableNotFound(_) | QueryError::ColumnNotFound(_) => ErrorKind::NotFound,
            QueryError::TableAlreadyExists(_)
            | QueryError::DuplicateColumn(_)
            | QueryError::SchemaError(_) => ErrorKind::Schema,
            QueryError::PrimaryKeyViolation { .. }
            | QueryError::NotNullViolation(_)
            | QueryError::ValueTooLong { .. } => ErrorKind::Constraint,
            QueryError::ValidationError(_)
            | QueryError::TypeError(_)
            | QueryError::InvalidLimit(_)
            | QueryError::AmbiguousColumn(_)
            | QueryError::ExecutionError(_)
            | QueryError::NumericOverflow
            | QueryError::DivisionByZero => ErrorKind::Validation,
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query resultset representation
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResultSet {
    /// Column names in the resultset
    columns: Vec<String>,
    /// Rows of data
    rows: Vec<Row>,
}

impl QueryResultSet {
    /// Create a new empty resultset with column names
    pub fn new(columns: Vec<String>) -> Self {
        QueryResultSet { columns, rows: Vec::new() }
    }

    /// One-row `status` result used by DDL statements
    pub fn status(message: impl Into<String>) -> Self {
        let mut result = QueryResultSet::new(vec!["status".to_string()]);
        result.add_row(Row::from_values(
            vec!["status".to_string()],
            vec![DataValue::Text(message.into())],
        ));
        result
    }

    /// One-row `rows_affected` result used by DML statements
    pub fn rows_affected(count: usize) -> Self {
        let mut result = QueryResultSet::new(vec!["rows_affected".to_string()]);
        result.add_row(Row::from_values(
            vec!["rows_affected".to_string()],
            vec![DataValue::Integer(count as i64)],
        ));
        result
    }

    /// Add a row to the resultset
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Get the columns in the resultset
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the rows in the resultset
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value of `column` in row `index`
    pub fn value(&self, index: usize, column: &str) -> Option<&DataValue> {
        self.rows.get(index).and_then(|row| row.get(column))
    }

    /// Every value of one column, in row order
    pub fn column_values(&self, column: &str) -> Vec<DataValue> {
        self.rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(DataValue::Null))
            .collect()
    }

    pub(crate) fn truncate(&mut self, max_rows: usize) {
        self.rows.truncate(max_rows);
    }

    /// Format the resultset as a string table
    pub fn to_string_table(&self) -> String {
        if self.columns.is_empty() {
            return "Empty result".to_string();
        }

        let cells: Vec<Vec<String>> = self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| row.get(col).map(|v| v.to_string()).unwrap_or_else(|| "NULL".to_string()))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                cells.iter().map(|r| r[i].chars().count()).chain(std::iter::once(col.chars().count())).max().unwrap_or(0)
            })
            .collect();

        let mut result = String::new();
        let render = |values: &[String], out: &mut String| {
            out.push('|');
            for (value, width) in values.iter().zip(&widths) {
                out.push_str(&format!(" {:<width$} |", value, width = *width));
            }
            out.push('\n');
        };

        render(&self.columns, &mut result);
        result.push('|');
        for width in &widths {
            result.push_str(&format!("{}|", "-".repeat(width + 2)));
        }
        result.push('\n');
        for row in &cells {
            render(row, &mut result);
        }
        result.push_str(&format!("({} row{})", self.rows.len(), if self.rows.len() == 1 { "" } else { "s" }));
        result
    }
}

/// Attempts to convert a DataValue to a target catalog DataType.
pub fn convert_data_value(value: &DataValue, target: &DataType) -> QueryResult<DataValue> {
    let mismatch = || {
        QueryError::TypeError(format!("Cannot convert {} {} to {}", value.type_name(), value, target))
    };
    match target {
        DataType::Integer => match value {
            DataValue::Null => Ok(DataValue::Null),
            DataValue::Integer(i) => Ok(DataValue::Integer(*i)),
            // i64::MAX as f64 rounds up to 2^63, which is already out of range
            DataValue::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Ok(DataValue::Integer(*f as i64))
            }
            DataValue::Text(s) => s.trim().parse::<i64>().map(DataValue::Integer).map_err(|_| mismatch()),
            DataValue::Boolean(b) => Ok(DataValue::Integer(if *b { 1 } else { 0 })),
            _ => Err(mismatch()),
        },
        DataType::Float => match value {
            DataValue::Null => Ok(DataValue::Null),
            DataValue::Integer(i) => Ok(DataValue::Float(*i as f64)),
            DataValue::Float(f) => Ok(DataValue::Float(*f)),
            DataValue::Text(s) => s.trim().parse::<f64>().map(DataValue::Float).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        DataType::Text | DataType::Varchar(_) => match value {
            DataValue::Null => Ok(DataValue::Null),
            DataValue::Text(s) => Ok(DataValue::Text(s.clone())),
            DataValue::Integer(_) | DataValue::Float(_) | DataValue::Date(_) => Ok(DataValue::Text(value.to_string())),
            DataValue::Boolean(_) => Err(mismatch()),
        },
        DataType::Boolean => match value {
            DataValue::Null => Ok(DataValue::Null),
            DataValue::Boolean(b) => Ok(DataValue::Boolean(*b)),
            DataValue::Integer(i) if *i == 0 || *i == 1 => Ok(DataValue::Boolean(*i == 1)),
            DataValue::Text(s) if s.eq_ignore_ascii_case("true") => Ok(DataValue::Boolean(true)),
            DataValue::Text(s) if s.eq_ignore_ascii_case("false") => Ok(DataValue::Boolean(false)),
            _ => Err(mismatch()),
        },
        DataType::Date => match value {
            DataValue::Null => Ok(DataValue::Null),
            DataValue::Date(d) => Ok(DataValue::Date(*d)),
            DataValue::Text(s) => DataValue::date(s.trim()),
            _ => Err(mismatch()),
        },
    }
}
