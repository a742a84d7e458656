use crate::{ColumnDescriptor, Row, RowError, RowFactory, Value, check_len};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Replace every `.` in a column name with `_` (`origin.time` -> `origin_time`).
///
/// The substitution is lossy: `a.b` and `a_b` both become `a_b`, which
/// [`field_names`] reports as a duplicate.
pub fn normalize_field_name(name: &str) -> String {
    name.replace('.', "_")
}

/// Normalized, validated field names for every column in `description`.
pub fn field_names(description: &[ColumnDescriptor]) -> Result<Vec<String>, RowError> {
    let mut seen = HashSet::with_capacity(description.len());
    let mut names = Vec::with_capacity(description.len());
    for col in description {
        let name = normalize_field_name(&col.name);
        if !is_identifier(&name) {
            return Err(RowError::InvalidFieldName(name));
        }
        if !seen.insert(name.clone()) {
            return Err(RowError::DuplicateFieldName(name));
        }
        names.push(name);
    }
    Ok(names)
}

// Leading underscores are reserved, matching named tuple rules.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Fixed-schema record: field names in column order with their values.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierRecord {
    fields: Vec<String>,
    values: Vec<Value>,
}

impl IdentifierRecord {
    /// Attribute-style access by normalized field name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| &self.values[i])
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl std::ops::Index<usize> for IdentifierRecord {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl Serialize for IdentifierRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Row factory producing [`IdentifierRecord`]s keyed by normalized column names.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierTupleRow;

impl RowFactory for IdentifierTupleRow {
    type Record = IdentifierRecord;

    fn shape(&self, description: &[ColumnDescriptor], row: Row) -> Result<IdentifierRecord, RowError> {
        check_len(description, &row)?;
        Ok(IdentifierRecord {
            fields: field_names(description)?,
            values: row,
        })
    }
}
