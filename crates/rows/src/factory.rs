use crate::{
    ColumnDescriptor, IdentifierRecord, IdentifierTupleRow, OrderedMappingRow, OrderedRecord, Row,
    RowError, SqlValuesRecord, SqlValuesTupleRow, TimeConvertingOrderedMappingRow, Value,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Turns one positional row into a record, given the cursor description.
pub trait RowFactory {
    type Record;

    fn shape(&self, description: &[ColumnDescriptor], row: Row) -> Result<Self::Record, RowError>;
}

/// Row factory selectable by name from cursor options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFactoryKind {
    #[serde(alias = "NamedTupleRow")]
    NamedTuple,
    #[serde(alias = "OrderedDictRow")]
    OrderedDict,
    #[serde(alias = "UTCOrdDictRow")]
    UtcOrderedDict,
    #[serde(alias = "SQLValuesRow")]
    SqlValues,
}

impl RowFactoryKind {
    pub fn name(self) -> &'static str {
        match self {
            RowFactoryKind::NamedTuple => "named_tuple",
            RowFactoryKind::OrderedDict => "ordered_dict",
            RowFactoryKind::UtcOrderedDict => "utc_ordered_dict",
            RowFactoryKind::SqlValues => "sql_values",
        }
    }

    /// Shape with the default settings of the selected factory.
    /// `utc_ordered_dict` converts with [`crate::utc_datetime`].
    pub fn shape(self, description: &[ColumnDescriptor], row: Row) -> Result<ShapedRecord, RowError> {
        Ok(match self {
            RowFactoryKind::NamedTuple => ShapedRecord::Named(IdentifierTupleRow.shape(description, row)?),
            RowFactoryKind::OrderedDict => ShapedRecord::Mapping(OrderedMappingRow.shape(description, row)?),
            RowFactoryKind::UtcOrderedDict => ShapedRecord::Mapping(
                TimeConvertingOrderedMappingRow::default().shape(description, row)?,
            ),
            RowFactoryKind::SqlValues => ShapedRecord::SqlValues(SqlValuesTupleRow.shape(description, row)?),
        })
    }
}

impl fmt::Display for RowFactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RowFactoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "named_tuple" | "NamedTupleRow" => Ok(RowFactoryKind::NamedTuple),
            "ordered_dict" | "OrderedDictRow" => Ok(RowFactoryKind::OrderedDict),
            "utc_ordered_dict" | "UTCOrdDictRow" => Ok(RowFactoryKind::UtcOrderedDict),
            "sql_values" | "SQLValuesRow" => Ok(RowFactoryKind::SqlValues),
            other => Err(format!("unknown row factory: {}", other)),
        }
    }
}

/// Output of any row factory, or the untouched row when none is selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShapedRecord {
    Tuple(Vec<Value>),
    Named(IdentifierRecord),
    Mapping(OrderedRecord),
    SqlValues(SqlValuesRecord),
}

impl ShapedRecord {
    /// Present `row` through `factory`, or as a plain tuple when there is none.
    pub fn from_row(
        factory: Option<RowFactoryKind>,
        description: &[ColumnDescriptor],
        row: Row,
    ) -> Result<Self, RowError> {
        match factory {
            Some(kind) => kind.shape(description, row),
            None => Ok(ShapedRecord::Tuple(row)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ShapedRecord::Tuple(v) => v.len(),
            ShapedRecord::Named(r) => r.len(),
            ShapedRecord::Mapping(r) => r.len(),
            ShapedRecord::SqlValues(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
