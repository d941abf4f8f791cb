//! Domain types shared by the writer pipeline and the store clients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ObjectId = String;
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Declared type of a source field.
///
/// The set is closed: every source column is mapped onto one of these before
/// a writer is created, and the codec matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    /// 8-bit integer.
    Byte,
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    String,
    Date,
    Timestamp,
    Binary,
    Struct(Vec<SchemaField>),
    Array(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
}

impl FieldType {
    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Byte => f.write_str("byte"),
            FieldType::Short => f.write_str("short"),
            FieldType::Int => f.write_str("int"),
            FieldType::Long => f.write_str("long"),
            FieldType::Float => f.write_str("float"),
            FieldType::Double => f.write_str("double"),
            FieldType::String => f.write_str("string"),
            FieldType::Date => f.write_str("date"),
            FieldType::Timestamp => f.write_str("timestamp"),
            FieldType::Binary => f.write_str("binary"),
            FieldType::Struct(fields) => {
                f.write_str("struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 { f.write_str(",")?; }
                    write!(f, "{}:{}", field.name, field.field_type)?;
                }
                f.write_str(">")
            }
            FieldType::Array(element) => write!(f, "array<{element}>"),
            FieldType::Map(key, value) => write!(f, "map<{key},{value}>"),
        }
    }
}

/// One named, typed column of a [`RecordSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Self { name: name.into(), field_type, nullable }
    }
}

/// Ordered field list known before any record is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSchema {
    fields: Vec<SchemaField>,
}

impl RecordSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self { Self { fields } }

    pub fn fields(&self) -> &[SchemaField] { &self.fields }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single source value as handed over by the processing engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    /// Members in the order of the declared struct fields.
    Struct(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map_or(Value::Null, Into::into) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Boolean(v) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::Int(v) }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Double(v) }
}

/// One row of source data. Values are positional against a [`RecordSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self { Self { values } }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn get(&self, index: usize) -> Option<&Value> { self.values.get(index) }

    pub fn values(&self) -> &[Value] { &self.values }
}

/// Which schema fields supply the object id and the vector.
/// Every other field becomes a property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub id: Option<String>,
    pub vector: Option<String>,
}

impl RoleMapping {
    pub fn is_id(&self, name: &str) -> bool { self.id.as_deref() == Some(name) }

    pub fn is_vector(&self, name: &str) -> bool { self.vector.as_deref() == Some(name) }
}

/// The object sent to the target store.
///
/// - `id`: hyphenated UUID string, from the id field or freshly generated
/// - `vector`: optional embedding taken from the vector field
/// - `tenant`: optional tenant the object is written under
/// - `properties`: converted values of all remaining fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetObject {
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub properties: Properties,
}

/// Structured validation error the store attaches to a rejected object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    pub messages: Vec<String>,
}

impl ObjectError {
    pub fn new(message: impl Into<String>) -> Self { Self { messages: vec![message.into()] } }
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("; "))
    }
}

/// Per-object result of a submitted batch. `error == None` means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectOutcome {
    pub id: ObjectId,
    pub error: Option<ObjectError>,
}

impl ObjectOutcome {
    pub fn ok(id: impl Into<ObjectId>) -> Self { Self { id: id.into(), error: None } }

    pub fn failed(id: impl Into<ObjectId>, error: ObjectError) -> Self {
        Self { id: id.into(), error: Some(error) }
    }

    pub fn is_ok(&self) -> bool { self.error.is_none() }
}

/// The store rejected the batch as a whole; no per-object outcomes exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("batch rejected: {message}")]
pub struct BatchFailure {
    pub message: String,
}

impl BatchFailure {
    pub fn new(message: impl Into<String>) -> Self { Self { message: message.into() } }
}

pub type BatchResult = std::result::Result<Vec<ObjectOutcome>, BatchFailure>;
