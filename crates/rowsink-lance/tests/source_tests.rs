use std::sync::Arc;

use arrow_array::builder::{Int32Builder, MapBuilder, StringBuilder};
use arrow_array::types::Float64Type;
use arrow_array::{Array, ArrayRef, BooleanArray, Date32Array, Int32Array, Int64Array, ListArray, RecordBatch, StringArray, StructArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::NaiveDate;

use rowsink_core::types::{FieldType, Value};
use rowsink_lance::source::{field_type, record_schema, records};

#[test]
fn arrow_types_map_onto_field_types() {
    assert_eq!(field_type(&DataType::Int64).unwrap(), FieldType::Long);
    assert_eq!(field_type(&DataType::LargeUtf8).unwrap(), FieldType::String);
    let list = DataType::List(Arc::new(Field::new("item", DataType::Float32, true)));
    assert_eq!(field_type(&list).unwrap(), FieldType::array_of(FieldType::Float));
    assert!(field_type(&DataType::UInt32).is_err());
}

#[test]
fn batch_rows_become_records() {
    let address = Arc::new(StructArray::from(vec![
        (Arc::new(Field::new("city", DataType::Utf8, true)), Arc::new(StringArray::from(vec![Some("Oslo"), None])) as ArrayRef),
        (Arc::new(Field::new("zip", DataType::Int32, true)), Arc::new(Int32Array::from(vec![Some(150), Some(7)])) as ArrayRef),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![Some("a"), None])),
        Arc::new(BooleanArray::from(vec![true, false])),
        Arc::new(Date32Array::from(vec![Some(19_000), None])),
        Arc::new(ListArray::from_iter_primitive::<Float64Type, _, _>(vec![Some(vec![Some(0.5), Some(1.5)]), None])),
        address.clone(),
    ];
    let schema = Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, true),
        Field::new("published", DataType::Boolean, false),
        Field::new("day", DataType::Date32, true),
        Field::new("embedding", DataType::List(Arc::new(Field::new("item", DataType::Float64, true))), true),
        Field::new("address", address.data_type().clone(), true),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let rs = record_schema(&schema).unwrap();
    assert_eq!(rs.len(), 5);
    assert_eq!(rs.field("embedding").unwrap().field_type, FieldType::array_of(FieldType::Double));

    let rows = records(&batch).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(0), Some(&Value::String("a".into())));
    assert_eq!(rows[1].get(0), Some(&Value::Null));
    assert_eq!(rows[0].get(2), Some(&Value::Date(NaiveDate::from_ymd_opt(2022, 1, 8).unwrap())));
    assert_eq!(rows[0].get(3), Some(&Value::Array(vec![Value::Double(0.5), Value::Double(1.5)])));
    assert_eq!(rows[1].get(3), Some(&Value::Null));
    assert_eq!(rows[1].get(4), Some(&Value::Struct(vec![Value::Null, Value::Int(7)])));
}

#[test]
fn map_and_long_columns_are_read_but_typed_as_unsupported() {
    let mut builder = MapBuilder::new(None, StringBuilder::new(), Int32Builder::new());
    builder.keys().append_value("k");
    builder.values().append_value(1);
    builder.append(true).unwrap();
    let map = builder.finish();
    let schema = Arc::new(Schema::new(vec![
        Field::new("counts", map.data_type().clone(), true),
        Field::new("n", DataType::Int64, true),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(map) as ArrayRef, Arc::new(Int64Array::from(vec![9]))]).unwrap();

    let rs = record_schema(&schema).unwrap();
    assert!(matches!(rs.fields()[0].field_type, FieldType::Map(..)));
    assert_eq!(rs.fields()[1].field_type, FieldType::Long);
    let rows = records(&batch).unwrap();
    assert_eq!(rows[0].get(0), Some(&Value::Map(vec![(Value::String("k".into()), Value::Int(1))])));
    assert_eq!(rows[0].get(1), Some(&Value::Long(9)));
}
