use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One scalar out of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
    Blob(Vec<u8>),
    List(Vec<Value>),
}

/// One positional result tuple, aligned with the cursor description.
pub type Row = Vec<Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short lowercase name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Time(_) => "time",
            Value::Blob(_) => "blob",
            Value::List(_) => "list",
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Time(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            Value::Blob(b) => serializer.serialize_str(&BASE64.encode(b)),
            Value::List(items) => items.serialize(serializer),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Semantic type of a column as reported by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCode(pub i32);

impl TypeCode {
    pub const UNKNOWN: TypeCode = TypeCode(0);
    pub const REAL: TypeCode = TypeCode(1);
    pub const INTEGER: TypeCode = TypeCode(2);
    pub const STRING: TypeCode = TypeCode(3);
    /// Epoch-seconds timestamp columns; the only code row factories act on.
    pub const TIME: TypeCode = TypeCode(4);
    pub const BLOB: TypeCode = TypeCode(5);

    pub fn is_time(self) -> bool {
        self == TypeCode::TIME
    }
}

/// Per-column metadata. Serialized as `[name, type_code]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_code: TypeCode,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_code: TypeCode) -> Self {
        Self {
            name: name.into(),
            type_code,
        }
    }
}

impl Serialize for ColumnDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, self.type_code).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColumnDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, type_code) = <(String, TypeCode)>::deserialize(deserializer)?;
        Ok(Self { name, type_code })
    }
}
