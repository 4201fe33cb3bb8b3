// Type Validation Module
//
// Checks values headed for the row store against a table schema, coercing
// them to the declared column type on the way in.

use crate::catalog::column::Column;
use crate::catalog::table::Table;
use crate::catalog::{ValidationError, ValidationResult};
use crate::query::executor::result::{convert_data_value, DataValue};

/// The type validator handles schema validation and type checking
pub struct TypeValidator;

impl TypeValidator {
    /// Validate a value against a column, returning it coerced to the
    /// column's declared type
    pub fn validate_value(value: &DataValue, column: &Column) -> ValidationResult<DataValue> {
        if value.is_null() {
            if !column.is_nullable() {
                return Err(ValidationError::NullValueNotAllowed(column.name().to_string()));
            }
            return Ok(DataValue::Null);
        }

        let coerced = convert_data_value(value, column.data_type()).map_err(|_| ValidationError::TypeMismatch {
            column: column.name().to_string(),
            expected: column.data_type().to_string(),
            actual: value.type_name().to_string(),
        })?;

        if let (Some(max), DataValue::Text(text)) = (column.data_type().max_length(), &coerced) {
            let actual = text.chars().count();
            if actual > max {
                return Err(ValidationError::ValueTooLong {
                    column: column.name().to_string(),
                    max,
                    actual,
                });
            }
        }

        Ok(coerced)
    }

    /// Validate a full positional row against a table schema
    pub fn validate_row(values: &[DataValue], table: &Table) -> ValidationResult<Vec<DataValue>> {
        if values.len() != table.columns().len() {
            return Err(ValidationError::ArityMismatch {
                expected: table.columns().len(),
                actual: values.len(),
            });
        }
        values
            .iter()
            .zip(table.columns())
            .map(|(value, column)| Self::validate_value(value, column))
            .collect()
    }
}
