//! curds_rows: row factories for positional result sets.
//! - `Value`, `TypeCode` and `ColumnDescriptor` describe what a cursor hands back
//! - Factories turn one (description, row) pair into a richer record
//! - `RowFactoryKind` selects a factory by name for request-driven shaping

mod error;
mod factory;
mod mapping;
mod named;
mod sql;
pub mod time;
mod value;

pub use error::RowError;
pub use factory::{RowFactory, RowFactoryKind, ShapedRecord};
pub use mapping::{OrderedMappingRow, OrderedRecord, TimeConvertingOrderedMappingRow};
pub use named::{IdentifierRecord, IdentifierTupleRow, field_names, normalize_field_name};
pub use sql::{SqlValuesRecord, SqlValuesTupleRow, sql_literal, values_to_string};
pub use time::{TimeConverter, utc_datetime};
pub use value::{ColumnDescriptor, Row, TypeCode, Value};

/// Fail unless `row` lines up with `description` one value per column.
pub(crate) fn check_len(description: &[ColumnDescriptor], row: &[Value]) -> Result<(), RowError> {
    if description.len() != row.len() {
        return Err(RowError::LengthMismatch {
            expected: description.len(),
            found: row.len(),
        });
    }
    Ok(())
}
