use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

/// Layout of a target table: one row per object, properties as a JSON document.
pub fn build_object_schema(vector_dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("tenant", DataType::Utf8, true),
		Field::new("properties", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), vector_dim), true),
		Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
	]))
}
