//! Record to object conversion.
//!
//! The id role must hold a UUID in its 36-character hyphenated form and is
//! kept exactly as written. The vector role must be a numeric sequence. Every
//! other field becomes a property converted by [`codec`].

use serde_json::Value as Json;
use uuid::Uuid;

use rowsink_core::error::{Error, Result};
use rowsink_core::types::{FieldType, Properties, Record, RecordSchema, RoleMapping, SchemaField, TargetObject, Value};

use crate::codec;

/// Turns records of one schema into [`TargetObject`]s.
///
/// Role fields are resolved to column positions once, at construction.
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    schema: RecordSchema,
    id_index: Option<usize>,
    vector_index: Option<usize>,
    tenant: Option<String>,
}

impl ObjectBuilder {
    /// Validates the whole schema up front so no record of an unwritable
    /// schema is ever converted.
    pub fn new(schema: RecordSchema, roles: &RoleMapping) -> Result<Self> {
        for field in schema.fields() {
            codec::check_field(field)?;
        }
        let id_index = resolve(&schema, roles.id.as_deref())?;
        let vector_index = resolve(&schema, roles.vector.as_deref())?;
        if let Some(i) = vector_index {
            let field = &schema.fields()[i];
            if !is_numeric_sequence(&field.field_type) {
                return Err(Error::InvalidVector {
                    field: field.name.clone(),
                    reason: format!("declared as {}", field.field_type),
                });
            }
        }
        Ok(Self { schema, id_index, vector_index, tenant: None })
    }

    pub fn with_tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant;
        self
    }

    pub fn build(&self, record: &Record) -> Result<TargetObject> {
        if record.len() != self.schema.len() {
            return Err(Error::FieldCountMismatch { expected: self.schema.len(), actual: record.len() });
        }
        for field in self.schema.fields() {
            codec::check_field(field)?;
        }

        let mut id = None;
        let mut vector = None;
        let mut properties = Properties::new();
        for (index, (field, value)) in self.schema.fields().iter().zip(record.values()).enumerate() {
            if Some(index) == self.id_index {
                id = Some(parse_id(field, value)?);
            } else if Some(index) == self.vector_index {
                vector = read_vector(field, value)?;
            } else {
                properties.insert(field.name.clone(), codec::convert_value(value, &field.field_type));
            }
        }

        Ok(TargetObject {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            vector,
            tenant: self.tenant.clone(),
            properties,
        })
    }
}

fn resolve(schema: &RecordSchema, name: Option<&str>) -> Result<Option<usize>> {
    match name {
        None => Ok(None),
        Some(name) => schema
            .fields()
            .iter()
            .position(|f| f.name == name)
            .map(Some)
            .ok_or_else(|| Error::UnknownRoleField(name.to_string())),
    }
}

fn is_numeric_sequence(field_type: &FieldType) -> bool {
    matches!(field_type, FieldType::Array(element) if matches!(**element, FieldType::Double | FieldType::Int))
}

fn parse_id(field: &SchemaField, value: &Value) -> Result<String> {
    let text = match codec::convert_value(value, &field.field_type) {
        Json::String(s) => s,
        other => other.to_string(),
    };
    match Uuid::parse_str(&text) {
        Ok(uuid) if text.eq_ignore_ascii_case(&uuid.hyphenated().to_string()) => Ok(text),
        _ => Err(Error::InvalidIdentifier { field: field.name.clone(), value: text }),
    }
}

fn read_vector(field: &SchemaField, value: &Value) -> Result<Option<Vec<f64>>> {
    let items = match value {
        Value::Null => return Ok(None),
        Value::Array(items) => items,
        other => {
            return Err(Error::InvalidVector { field: field.name.clone(), reason: format!("got {other:?}") });
        }
    };
    let mut vector = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let x = match item {
            Value::Double(v) => *v,
            Value::Float(v) => f64::from(*v),
            Value::Int(v) => f64::from(*v),
            Value::Short(v) => f64::from(*v),
            Value::Byte(v) => f64::from(*v),
            other => {
                return Err(Error::InvalidVector {
                    field: field.name.clone(),
                    reason: format!("element {i} is {other:?}"),
                });
            }
        };
        vector.push(x);
    }
    Ok(Some(vector))
}
