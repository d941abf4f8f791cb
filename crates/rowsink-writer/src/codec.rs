//! Source value to store JSON conversion.
//!
//! `check_field` rejects declared types the store cannot represent without
//! precision loss or an ambiguous mapping: byte, short, long, float, map, and
//! any struct member or sequence element of those types. Everything that
//! passes the check converts infallibly.

use chrono::NaiveDate;
use serde_json::{Map, Number, Value as Json};

use rowsink_core::error::{Error, Result};
use rowsink_core::types::{FieldType, SchemaField, Value};

/// Fails with `UnsupportedType` if `field` cannot be written.
pub fn check_field(field: &SchemaField) -> Result<()> {
    if is_unsupported(&field.field_type) {
        return Err(Error::UnsupportedType { field: field.name.clone(), field_type: field.field_type.clone() });
    }
    Ok(())
}

fn is_unsupported(field_type: &FieldType) -> bool {
    match field_type {
        FieldType::Byte | FieldType::Short | FieldType::Long | FieldType::Float | FieldType::Map(..) => true,
        FieldType::Array(element) => is_unsupported(element),
        FieldType::Struct(fields) => fields.iter().any(|f| is_unsupported(&f.field_type)),
        FieldType::Boolean
        | FieldType::Int
        | FieldType::Double
        | FieldType::String
        | FieldType::Date
        | FieldType::Timestamp
        | FieldType::Binary => false,
    }
}

/// Check the declared type, then convert `value` against it.
pub fn convert_field(field: &SchemaField, value: &Value) -> Result<Json> {
    check_field(field)?;
    Ok(convert_value(value, &field.field_type))
}

/// Convert a value whose declared type already passed [`check_field`].
///
/// Null strings become `""` and null sequences `[]`; values whose shape does
/// not match the declared type are passed through by their own shape.
pub fn convert_value(value: &Value, field_type: &FieldType) -> Json {
    match (field_type, value) {
        (FieldType::String, Value::Null) => Json::String(String::new()),
        (FieldType::Array(_), Value::Null) => Json::Array(Vec::new()),
        (_, Value::Null) => Json::Null,
        (FieldType::Date | FieldType::Timestamp, Value::Date(date)) => Json::String(day_string(*date)),
        (FieldType::Date | FieldType::Timestamp, Value::Timestamp(ts)) => Json::String(day_string(ts.date_naive())),
        (FieldType::Struct(fields), Value::Struct(members)) => {
            let mut object = Map::with_capacity(fields.len());
            for (i, field) in fields.iter().enumerate() {
                let member = members.get(i).unwrap_or(&Value::Null);
                object.insert(field.name.clone(), convert_value(member, &field.field_type));
            }
            Json::Object(object)
        }
        (FieldType::Array(element), Value::Array(items)) => {
            Json::Array(items.iter().map(|item| convert_value(item, element)).collect())
        }
        (_, other) => passthrough(other),
    }
}

fn passthrough(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Byte(v) => Json::from(*v),
        Value::Short(v) => Json::from(*v),
        Value::Int(v) => Json::from(*v),
        Value::Long(v) => Json::from(*v),
        Value::Float(v) => float(f64::from(*v)),
        Value::Double(v) => float(*v),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(date) => Json::String(day_string(*date)),
        Value::Timestamp(ts) => Json::String(day_string(ts.date_naive())),
        Value::Binary(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::Array(items) | Value::Struct(items) => Json::Array(items.iter().map(passthrough).collect()),
        Value::Map(entries) => {
            if entries.iter().all(|(k, _)| matches!(k, Value::String(_))) {
                let mut object = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    if let Value::String(key) = k {
                        object.insert(key.clone(), passthrough(v));
                    }
                }
                Json::Object(object)
            } else {
                Json::Array(entries.iter().map(|(k, v)| Json::Array(vec![passthrough(k), passthrough(v)])).collect())
            }
        }
    }
}

// NaN and infinities have no JSON form.
fn float(v: f64) -> Json {
    Number::from_f64(v).map_or(Json::Null, Json::Number)
}

/// ISO-8601 at day precision, midnight UTC.
fn day_string(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn field(name: &str, field_type: FieldType) -> SchemaField { SchemaField::new(name, field_type, true) }

    #[test]
    fn rejects_each_unsupported_type() {
        let rejected = [
            FieldType::Byte,
            FieldType::Short,
            FieldType::Long,
            FieldType::Float,
            FieldType::array_of(FieldType::Float),
            FieldType::array_of(FieldType::Long),
            FieldType::Map(Box::new(FieldType::String), Box::new(FieldType::Int)),
        ];
        for t in rejected {
            let err = check_field(&field("f", t.clone())).unwrap_err();
            assert!(matches!(err, Error::UnsupportedType { ref field, .. } if field == "f"), "{t} should be rejected");
        }
    }

    #[test]
    fn rejects_unsupported_member_inside_struct() {
        let nested = FieldType::Struct(vec![field("ok", FieldType::Int), field("bad", FieldType::Long)]);
        assert!(check_field(&field("s", nested)).is_err());
        let seq = FieldType::array_of(FieldType::Struct(vec![field("bad", FieldType::Short)]));
        assert!(check_field(&field("s", seq)).is_err());
    }

    #[test]
    fn convert_field_fails_before_reading_value() {
        let err = convert_field(&field("n", FieldType::Long), &Value::Long(7)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }

    #[test]
    fn scalars_convert() {
        assert_eq!(convert_value(&Value::Boolean(true), &FieldType::Boolean), json!(true));
        assert_eq!(convert_value(&Value::Int(-3), &FieldType::Int), json!(-3));
        assert_eq!(convert_value(&Value::Double(1.5), &FieldType::Double), json!(1.5));
        assert_eq!(convert_value(&Value::Double(f64::NAN), &FieldType::Double), Json::Null);
        assert_eq!(convert_value(&"hi".into(), &FieldType::String), json!("hi"));
        assert_eq!(convert_value(&Value::Null, &FieldType::Int), Json::Null);
    }

    #[test]
    fn null_string_becomes_empty_and_null_sequence_becomes_empty_array() {
        assert_eq!(convert_value(&Value::Null, &FieldType::String), json!(""));
        assert_eq!(convert_value(&Value::Null, &FieldType::array_of(FieldType::String)), json!([]));
        assert_eq!(convert_value(&Value::Array(vec![]), &FieldType::array_of(FieldType::Int)), json!([]));
    }

    #[test]
    fn dates_and_timestamps_have_day_precision() {
        let d = NaiveDate::from_ymd_opt(2022, 3, 9).unwrap();
        assert_eq!(convert_value(&Value::Date(d), &FieldType::Date), json!("2022-03-09T00:00:00Z"));
        let ts = Utc.with_ymd_and_hms(2021, 12, 31, 23, 59, 1).unwrap();
        assert_eq!(convert_value(&Value::Timestamp(ts), &FieldType::Timestamp), json!("2021-12-31T00:00:00Z"));
    }

    #[test]
    fn nested_struct_and_sequences_convert_recursively() {
        let author = FieldType::Struct(vec![
            field("name", FieldType::String),
            field("tags", FieldType::array_of(FieldType::String)),
        ]);
        let t = FieldType::array_of(author);
        let v = Value::Array(vec![
            Value::Struct(vec!["Ann".into(), Value::Array(vec!["a".into(), Value::Null])]),
            Value::Struct(vec![Value::Null, Value::Null]),
        ]);
        assert_eq!(
            convert_value(&v, &t),
            json!([{"name": "Ann", "tags": ["a", ""]}, {"name": "", "tags": []}])
        );
    }

    #[test]
    fn mismatched_and_binary_values_pass_through() {
        assert_eq!(convert_value(&Value::Int(4), &FieldType::String), json!(4));
        assert_eq!(convert_value(&Value::Binary(vec![1, 255]), &FieldType::Binary), json!([1, 255]));
        let m = Value::Map(vec![("k".into(), Value::Int(1))]);
        assert_eq!(convert_value(&m, &FieldType::Boolean), json!({"k": 1}));
    }
}
