use std::fs;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Format, Toml};
use figment::Figment;
use tempfile::TempDir;

use rowsink_core::config::{expand_path, Config, WriterOptions};
use rowsink_core::types::{FieldType, ObjectError, RecordSchema, SchemaField, TargetObject};

#[test]
fn writer_options_from_toml_file_fill_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[writer]\nclass_name = \"Article\"\nid = \"uuid\"\n\n[store]\nuri = \"/tmp/db\"\nvector_dim = 4\n").unwrap();

    let config = Config::from_figment(Figment::new().merge(Toml::file(&path)));
    let writer = config.writer_options().expect("writer options");

    assert_eq!(writer.class_name, "Article");
    assert_eq!(writer.batch_size, 100);
    assert_eq!(writer.max_retries, 2);
    assert_eq!(writer.backoff(), Duration::from_secs(2));
    assert_eq!(writer.roles().id.as_deref(), Some("uuid"));
    assert!(writer.roles().vector.is_none());
    assert!(!writer.fail_on_incomplete);

    let store = config.store_options().expect("store options");
    assert_eq!(store.vector_dim, 4);
}

#[test]
fn writer_options_reject_zero_batch_size() {
    let config = Config::from_figment(Figment::from(Toml::string("[writer]\nclass_name = \"A\"\nbatch_size = 0\n")));
    let err = config.writer_options().unwrap_err();
    assert!(err.to_string().contains("batch_size"), "got: {err}");
}

#[test]
fn writer_options_reject_same_id_and_vector_field() {
    let mut options = WriterOptions::new("Article");
    options.id = Some("f".into());
    options.vector = Some("f".into());
    assert!(options.validate().is_err());
    options.vector = Some("embedding".into());
    assert!(options.validate().is_ok());
}

#[test]
fn store_options_reject_zero_dim() {
    let config = Config::from_figment(Figment::from(Toml::string("[store]\nuri = \"x\"\nvector_dim = 0\n")));
    assert!(config.store_options().is_err());
}

#[test]
fn store_uri_expands_env_vars() {
    std::env::set_var("ROWSINK_CORE_TEST_ROOT", "/data");
    assert_eq!(expand_path("$ROWSINK_CORE_TEST_ROOT/lancedb"), Path::new("/data/lancedb"));
    assert_eq!(expand_path("/abs/db"), Path::new("/abs/db"));
}

#[test]
fn field_type_display_is_readable() {
    let t = FieldType::Struct(vec![
        SchemaField::new("a", FieldType::Int, true),
        SchemaField::new("b", FieldType::array_of(FieldType::Double), true),
    ]);
    assert_eq!(t.to_string(), "struct<a:int,b:array<double>>");
    assert_eq!(FieldType::Map(Box::new(FieldType::String), Box::new(FieldType::Long)).to_string(), "map<string,long>");
}

#[test]
fn schema_lookup_by_name() {
    let schema = RecordSchema::new(vec![
        SchemaField::new("title", FieldType::String, true),
        SchemaField::new("year", FieldType::Int, false),
    ]);
    assert_eq!(schema.len(), 2);
    assert_eq!(schema.field("year").map(|f| &f.field_type), Some(&FieldType::Int));
    assert!(schema.field("missing").is_none());
}

#[test]
fn target_object_serializes_without_absent_vector() {
    let object = TargetObject { id: "6b1f6c0e-2b43-4a4c-9d55-1f7b1b1d6e0a".into(), vector: None, tenant: None, properties: Default::default() };
    let json = serde_json::to_value(&object).unwrap();
    assert!(json.get("vector").is_none());
    assert!(json.get("tenant").is_none());
    assert_eq!(ObjectError { messages: vec!["a".into(), "b".into()] }.to_string(), "a; b");
}
