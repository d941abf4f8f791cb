//! Arrow batches as writer input.
//!
//! Each source `RecordBatch` is one data partition: its schema maps onto a
//! `RecordSchema` and its rows onto `Record`s. Column types without a
//! `FieldType` counterpart (unsigned integers, decimals, intervals, ...) are
//! refused here, before any writer is created.

use anyhow::{anyhow, bail, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use arrow_array::{Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema, TimeUnit};

use rowsink_core::types::{FieldType, Record, RecordSchema, SchemaField, Value};

pub fn field_type(data_type: &DataType) -> Result<FieldType> {
    Ok(match data_type {
        DataType::Boolean => FieldType::Boolean,
        DataType::Int8 => FieldType::Byte,
        DataType::Int16 => FieldType::Short,
        DataType::Int32 => FieldType::Int,
        DataType::Int64 => FieldType::Long,
        DataType::Float32 => FieldType::Float,
        DataType::Float64 => FieldType::Double,
        DataType::Utf8 | DataType::LargeUtf8 => FieldType::String,
        DataType::Date32 | DataType::Date64 => FieldType::Date,
        DataType::Timestamp(_, _) => FieldType::Timestamp,
        DataType::Binary | DataType::LargeBinary => FieldType::Binary,
        DataType::Struct(fields) => FieldType::Struct(
            fields.iter().map(|f| schema_field(f)).collect::<Result<Vec<_>>>()?,
        ),
        DataType::List(item) | DataType::LargeList(item) | DataType::FixedSizeList(item, _) => {
            FieldType::array_of(field_type(item.data_type())?)
        }
        DataType::Map(entries, _) => match entries.data_type() {
            DataType::Struct(kv) if kv.len() == 2 => FieldType::Map(
                Box::new(field_type(kv[0].data_type())?),
                Box::new(field_type(kv[1].data_type())?),
            ),
            other => bail!("malformed map entries type {other}"),
        },
        other => bail!("source column type {other} has no writer mapping"),
    })
}

fn schema_field(field: &Field) -> Result<SchemaField> {
    let field_type = field_type(field.data_type()).map_err(|e| anyhow!("column '{}': {e}", field.name()))?;
    Ok(SchemaField::new(field.name().clone(), field_type, field.is_nullable()))
}

pub fn record_schema(schema: &Schema) -> Result<RecordSchema> {
    Ok(RecordSchema::new(schema.fields().iter().map(|f| schema_field(f)).collect::<Result<Vec<_>>>()?))
}

/// All rows of `batch`, in order.
pub fn records(batch: &RecordBatch) -> Result<Vec<Record>> {
    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let values = batch
            .columns()
            .iter()
            .map(|column| value_at(column.as_ref(), row))
            .collect::<Result<Vec<_>>>()?;
        rows.push(Record::new(values));
    }
    Ok(rows)
}

fn value_at(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Boolean => Value::Boolean(array.as_boolean().value(row)),
        DataType::Int8 => Value::Byte(array.as_primitive::<Int8Type>().value(row)),
        DataType::Int16 => Value::Short(array.as_primitive::<Int16Type>().value(row)),
        DataType::Int32 => Value::Int(array.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => Value::Long(array.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Value::Float(array.as_primitive::<Float32Type>().value(row)),
        DataType::Float64 => Value::Double(array.as_primitive::<Float64Type>().value(row)),
        DataType::Utf8 => Value::String(array.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(array.as_string::<i64>().value(row).to_string()),
        DataType::Date32 => date(array.as_primitive::<Date32Type>().value_as_date(row))?,
        DataType::Date64 => date(array.as_primitive::<Date64Type>().value_as_date(row))?,
        DataType::Timestamp(unit, _) => {
            let naive = match unit {
                TimeUnit::Second => array.as_primitive::<TimestampSecondType>().value_as_datetime(row),
                TimeUnit::Millisecond => array.as_primitive::<TimestampMillisecondType>().value_as_datetime(row),
                TimeUnit::Microsecond => array.as_primitive::<TimestampMicrosecondType>().value_as_datetime(row),
                TimeUnit::Nanosecond => array.as_primitive::<TimestampNanosecondType>().value_as_datetime(row),
            };
            Value::Timestamp(naive.ok_or_else(|| anyhow!("timestamp out of range at row {row}"))?.and_utc())
        }
        DataType::Binary => Value::Binary(array.as_binary::<i32>().value(row).to_vec()),
        DataType::LargeBinary => Value::Binary(array.as_binary::<i64>().value(row).to_vec()),
        DataType::Struct(_) => {
            let s = array.as_struct();
            Value::Struct(s.columns().iter().map(|c| value_at(c.as_ref(), row)).collect::<Result<Vec<_>>>()?)
        }
        DataType::List(_) => elements(array.as_list::<i32>().value(row).as_ref())?,
        DataType::LargeList(_) => elements(array.as_list::<i64>().value(row).as_ref())?,
        DataType::FixedSizeList(_, _) => elements(array.as_fixed_size_list().value(row).as_ref())?,
        DataType::Map(_, _) => {
            let entries = array.as_map().value(row);
            let (keys, values) = (entries.column(0), entries.column(1));
            let mut pairs = Vec::with_capacity(entries.len());
            for i in 0..entries.len() {
                pairs.push((value_at(keys.as_ref(), i)?, value_at(values.as_ref(), i)?));
            }
            Value::Map(pairs)
        }
        other => bail!("source column type {other} has no writer mapping"),
    };
    Ok(value)
}

fn elements(list: &dyn Array) -> Result<Value> {
    Ok(Value::Array((0..list.len()).map(|i| value_at(list, i)).collect::<Result<Vec<_>>>()?))
}

fn date(d: Option<chrono::NaiveDate>) -> Result<Value> {
    d.map(Value::Date).ok_or_else(|| anyhow!("date out of range"))
}
