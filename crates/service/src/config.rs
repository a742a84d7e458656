use crate::ServiceError;
use curds_rows::RowFactoryKind;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Options a request may pass under `params.cursor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CursorOptions {
    /// Shape rows before returning them; raw tuples when unset.
    pub row_factory: Option<RowFactoryKind>,
    /// Have the cursor hand back time-typed columns as timestamps.
    #[serde(alias = "CONVERT_DATETIME")]
    pub convert_datetime: bool,
}

impl CursorOptions {
    pub fn from_json(value: JsonValue) -> Result<Self, ServiceError> {
        serde_json::from_value(value).map_err(|e| ServiceError::invalid("cursor", e.to_string()))
    }

    pub fn set_row_factory(mut self, kind: Option<RowFactoryKind>) -> Self {
        self.row_factory = kind;
        self
    }

    pub fn set_convert_datetime(mut self, on: bool) -> Self {
        self.convert_datetime = on;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Identifier handed to `Database::connect`; must not be empty.
    pub database: String,
    /// Used when a request carries no `params.cursor` of its own.
    pub cursor: CursorOptions,
}

impl ServiceConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn set_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn set_cursor_options(mut self, cursor: CursorOptions) -> Self {
        self.cursor = cursor;
        self
    }
}
