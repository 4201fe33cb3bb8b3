// Data Type Module
//
// This module defines the column data types supported by the row store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Data types supported by the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
    /// Text with a maximum length in characters
    Varchar(usize),
    Boolean,
    Date,
}

impl DataType {
    /// Check if this is a numeric data type
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }

    /// Check if this is a character data type
    pub fn is_textual(&self) -> bool {
        matches!(self, DataType::Text | DataType::Varchar(_))
    }

    /// Maximum length for bounded text types
    pub fn max_length(&self) -> Option<usize> {
        match self {
            DataType::Varchar(len) => Some(*len),
            _ => None,
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    /// Convert a string representation to a DataType
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if let Some(rest) = upper.strip_prefix("VARCHAR") {
            let len = rest
                .trim()
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .ok_or_else(|| format!("Malformed VARCHAR type: {}", s))?;
            return len
                .trim()
                .parse::<usize>()
                .map(DataType::Varchar)
                .map_err(|_| format!("Invalid VARCHAR length in: {}", s));
        }
        match upper.as_str() {
            "INT" | "INTEGER" | "BIGINT" => Ok(DataType::Integer),
            "FLOAT" | "REAL" | "DOUBLE" | "DECIMAL" => Ok(DataType::Float),
            "TEXT" | "STRING" => Ok(DataType::Text),
            "BOOL" | "BOOLEAN" => Ok(DataType::Boolean),
            "DATE" => Ok(DataType::Date),
            _ => Err(format!("Unknown data type: {}", s)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Varchar(len) => write!(f, "VARCHAR({})", len),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Date => write!(f, "DATE"),
        }
    }
}
