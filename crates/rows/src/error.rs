use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("row has {found} values but the description has {expected} columns")]
    LengthMismatch { expected: usize, found: usize },

    #[error("field names must be valid identifiers: '{0}'")]
    InvalidFieldName(String),

    #[error("duplicate field name: '{0}'")]
    DuplicateFieldName(String),

    #[error("{0} values are not supported in SQL values rows")]
    UnsupportedType(&'static str),

    #[error("cannot convert {0} to a timestamp")]
    TimeConversion(String),
}

impl RowError {
    /// Stable error-kind name reported to RPC clients.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::LengthMismatch { .. } => "RowLengthError",
            RowError::InvalidFieldName(_) | RowError::DuplicateFieldName(_) => "NamingError",
            RowError::UnsupportedType(_) | RowError::TimeConversion(_) => "ValueConversionError",
        }
    }
}
