use crate::{ColumnDescriptor, Row, RowError, RowFactory, Value, check_len, field_names};
use serde::ser::{Serialize, Serializer};
use std::fmt;

/// Render one value as an SQL literal.
///
/// Text is single-quoted with embedded quotes doubled, numbers use their
/// decimal form and null becomes `NULL`. Anything else is rejected.
pub fn sql_literal(value: &Value) -> Result<String, RowError> {
    match value {
        Value::Text(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) if f.is_finite() => Ok(format!("{f:?}")),
        Value::Null => Ok("NULL".to_string()),
        Value::Float(_) => Err(RowError::UnsupportedType("non-finite float")),
        other => Err(RowError::UnsupportedType(other.type_name())),
    }
}

/// `(v1, v2, ..., vn)`, ready to follow an SQL `VALUES` keyword.
///
/// Takes already-converted literals, so callers can format a subset or a
/// reordering of a record's values (e.g. for an `UPDATE ... SET`).
pub fn values_to_string<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::from("(");
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(v.as_ref());
    }
    out.push(')');
    out
}

/// Record of SQL literal strings keyed by normalized field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlValuesRecord {
    fields: Vec<String>,
    values: Vec<String>,
}

impl SqlValuesRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| self.values[i].as_str())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

impl fmt::Display for SqlValuesRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&values_to_string(&self.values))
    }
}

impl Serialize for SqlValuesRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Row factory producing [`SqlValuesRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlValuesTupleRow;

impl SqlValuesTupleRow {
    /// Same as the free [`values_to_string`].
    pub fn values_to_string<S: AsRef<str>>(values: &[S]) -> String {
        values_to_string(values)
    }
}

impl RowFactory for SqlValuesTupleRow {
    type Record = SqlValuesRecord;

    fn shape(&self, description: &[ColumnDescriptor], row: Row) -> Result<SqlValuesRecord, RowError> {
        check_len(description, &row)?;
        let fields = field_names(description)?;
        let values = row.iter().map(sql_literal).collect::<Result<Vec<_>, _>>()?;
        Ok(SqlValuesRecord { fields, values })
    }
}
