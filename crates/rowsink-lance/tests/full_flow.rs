use std::sync::Arc;

use arrow_array::types::Float64Type;
use arrow_array::{ArrayRef, Int32Array, ListArray, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use tempfile::TempDir;

use rowsink_core::config::WriterOptions;
use rowsink_core::types::{ObjectError, TargetObject};
use rowsink_core::StoreClient;
use rowsink_lance::{source, table, LanceStore};
use rowsink_writer::PartitionWriter;

const DIM: usize = 3;

fn source_batch(start: i32, n: i32) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("uuid", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("wordCount", DataType::Int32, true),
        Field::new("embedding", DataType::List(Arc::new(Field::new("item", DataType::Float64, true))), true),
    ]));
    let ids: Vec<String> = (start..start + n).map(|i| format!("00000000-0000-4000-8000-{i:012}")).collect();
    let titles: Vec<Option<String>> = (start..start + n).map(|i| if i % 2 == 0 { Some(format!("t{i}")) } else { None }).collect();
    let counts: Vec<i32> = (start..start + n).collect();
    let vectors: Vec<Option<Vec<Option<f64>>>> = (start..start + n).map(|i| Some(vec![Some(f64::from(i)); DIM])).collect();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(StringArray::from(titles)),
        Arc::new(Int32Array::from(counts)),
        Arc::new(ListArray::from_iter_primitive::<Float64Type, _, _>(vectors)),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

#[test]
fn source_partitions_land_in_target_table() {
    let tmp = TempDir::new().expect("tmp");
    let uri = tmp.path().to_string_lossy().to_string();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let conn = table::open_db(&uri).await.unwrap();
        table::append_batches(&conn, "source", vec![source_batch(0, 5), source_batch(5, 4)]).await.unwrap();
    });
    let partitions = rt.block_on(async {
        let conn = table::open_db(&uri).await.unwrap();
        table::scan_batches(&conn, "source").await.unwrap()
    });
    drop(rt);
    assert_eq!(partitions.iter().map(RecordBatch::num_rows).sum::<usize>(), 9);

    let store = LanceStore::open(&uri, "Article", DIM).expect("store");
    let mut options = WriterOptions::new("Article");
    options.batch_size = 4;
    options.retries_backoff_secs = 0;
    options.id = Some("uuid".into());
    options.vector = Some("embedding".into());

    let mut written = 0;
    for (i, batch) in partitions.iter().enumerate() {
        let schema = source::record_schema(&batch.schema()).expect("schema");
        let mut writer = PartitionWriter::new(i as u64, schema, options.clone(), &store).expect("writer");
        for record in source::records(batch).expect("records") {
            writer.write(&record).expect("write");
        }
        let message = writer.commit().expect("commit");
        assert!(message.is_complete(), "{message}");
        written += message.written;
    }
    assert_eq!(written, 9);
    assert_eq!(store.count().expect("count"), 9);

    // Same ids again: upsert, not append.
    let schema = source::record_schema(&partitions[0].schema()).expect("schema");
    let mut writer = PartitionWriter::new(99, schema, options, &store).expect("writer");
    for record in source::records(&partitions[0]).expect("records") {
        writer.write(&record).expect("write");
    }
    writer.commit().expect("commit");
    assert_eq!(store.count().expect("count"), 9);
}

#[test]
fn wrong_dimension_is_a_per_object_error() {
    let tmp = TempDir::new().expect("tmp");
    let store = LanceStore::open(&tmp.path().to_string_lossy(), "Things", DIM).expect("store");
    let good = TargetObject {
        id: "00000000-0000-4000-8000-000000000001".into(),
        vector: Some(vec![1.0, 2.0, 3.0]),
        tenant: Some("t1".into()),
        properties: Default::default(),
    };
    let bad = TargetObject { id: "00000000-0000-4000-8000-000000000002".into(), vector: Some(vec![1.0]), ..good.clone() };

    let outcomes = store.submit_batch(&[good.clone(), bad.clone()]).expect("batch accepted");
    assert_eq!(outcomes.len(), 2);
    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, bad.id);
    assert_eq!(
        failed[0].error,
        Some(ObjectError::new("vector has 1 dimensions, table expects 3"))
    );
    assert_eq!(store.count().expect("count"), 1);
}
