// Column Management Module
//
// This module defines the Column type that represents a database column schema.

use serde::{Deserialize, Serialize};

use super::data_type::DataType;
use crate::query::executor::result::DataValue;

fn default_nullable() -> bool {
    true
}

/// Represents a column in a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    name: String,
    /// Column data type
    data_type: DataType,
    /// Whether this column can contain NULL values
    #[serde(default = "default_nullable")]
    nullable: bool,
    /// Whether this column is part of the primary key
    #[serde(default)]
    primary_key: bool,
    /// Default value used when an insert omits the column
    #[serde(default)]
    default_value: Option<DataValue>,
}

impl Column {
    /// Create a new column
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        nullable: bool,
        primary_key: bool,
        default_value: Option<DataValue>,
    ) -> Self {
        Column {
            name: name.into(),
            data_type,
            // Primary key columns are never nullable
            nullable: nullable && !primary_key,
            primary_key,
            default_value,
        }
    }

    /// Shorthand for a nullable, non-key column without a default
    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Column::new(name, data_type, true, false, None)
    }

    /// Builder: attach a default value
    pub fn with_default(mut self, value: DataValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Get the column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the column data type
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Check if the column can contain NULL values
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Check if the column is part of the primary key
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Get the default value (if any)
    pub fn default_value(&self) -> Option<&DataValue> {
        self.default_value.as_ref()
    }

    pub(crate) fn mark_primary_key(&mut self) {
        self.primary_key = true;
        self.nullable = false;
    }

    /// Rename the column
    pub(crate) fn rename(&mut self, new_name: &str) {
        self.name = new_name.to_string();
    }
}
