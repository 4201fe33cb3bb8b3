//! Catalog Management Module
//!
//! This module holds table schema metadata: data types, column and table
//! definitions, and the validator that checks values against them.

pub mod column;
pub mod data_type;
pub mod table;
pub mod validation;
pub mod validation_error;

// Re-export key types
pub use self::column::Column;
pub use self::data_type::DataType;
pub use self::table::Table;
pub use self::validation::TypeValidator;
pub use self::validation_error::{ValidationError, ValidationResult};
