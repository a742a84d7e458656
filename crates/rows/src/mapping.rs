use crate::time::{TimeConverter, utc_datetime};
use crate::{ColumnDescriptor, Row, RowError, RowFactory, Value, check_len};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

/// Insertion-ordered mapping from raw column name to value.
///
/// Re-inserting a key replaces its value but keeps the key where it first
/// appeared, so duplicate column names collapse to the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedRecord {
    entries: Vec<(String, Value)>,
}

impl OrderedRecord {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap),
        }
    }

    /// Insert or overwrite; returns the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OrderedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Row factory producing [`OrderedRecord`]s keyed by raw column names.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedMappingRow;

impl RowFactory for OrderedMappingRow {
    type Record = OrderedRecord;

    fn shape(&self, description: &[ColumnDescriptor], row: Row) -> Result<OrderedRecord, RowError> {
        check_len(description, &row)?;
        let mut record = OrderedRecord::with_capacity(row.len());
        for (col, value) in description.iter().zip(row) {
            record.insert(col.name.as_str(), value);
        }
        Ok(record)
    }
}

/// Like [`OrderedMappingRow`], but non-null values in time-typed columns
/// go through a [`TimeConverter`] first. Without a converter they pass
/// through untouched.
#[derive(Clone)]
pub struct TimeConvertingOrderedMappingRow {
    convert: Option<TimeConverter>,
}

impl TimeConvertingOrderedMappingRow {
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(Value) -> Result<Value, RowError> + Send + Sync + 'static,
    {
        Self {
            convert: Some(Arc::new(convert)),
        }
    }

    pub fn without_conversion() -> Self {
        Self { convert: None }
    }
}

/// Converts with [`utc_datetime`].
impl Default for TimeConvertingOrderedMappingRow {
    fn default() -> Self {
        Self::new(utc_datetime)
    }
}

impl fmt::Debug for TimeConvertingOrderedMappingRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeConvertingOrderedMappingRow")
            .field("convert", &self.convert.is_some())
            .finish()
    }
}

impl RowFactory for TimeConvertingOrderedMappingRow {
    type Record = OrderedRecord;

    fn shape(&self, description: &[ColumnDescriptor], row: Row) -> Result<OrderedRecord, RowError> {
        check_len(description, &row)?;
        let mut record = OrderedRecord::with_capacity(row.len());
        for (col, value) in description.iter().zip(row) {
            let value = match &self.convert {
                Some(convert) if col.type_code.is_time() && !value.is_null() => convert(value)?,
                _ => value,
            };
            record.insert(col.name.as_str(), value);
        }
        Ok(record)
    }
}
