//! `StoreClient` backed by a LanceDB table.
//!
//! Objects are validated one by one (UUID id, vector dimensionality, finite
//! components); invalid ones come back as per-object errors. The valid rest is
//! upserted by `id` with a single `merge_insert`, and any LanceDB failure there
//! is reported as a whole-batch failure.

use anyhow::Result;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use lancedb::Connection;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::debug;

use rowsink_core::traits::StoreClient;
use rowsink_core::types::{BatchFailure, BatchResult, ObjectError, ObjectOutcome, TargetObject};

use crate::schema::build_object_schema;
use crate::table::{count_rows, ensure_table, open_db};

pub struct LanceStore {
    runtime: Runtime,
    db: Connection,
    table_name: String,
    vector_dim: i32,
}

impl LanceStore {
    /// Connect to `uri` and make sure the target table exists.
    ///
    /// The store owns its runtime; call it from synchronous code only.
    pub fn open(uri: &str, table_name: &str, vector_dim: usize) -> Result<Self> {
        let vector_dim = i32::try_from(vector_dim)?;
        let runtime = Runtime::new()?;
        let db = runtime.block_on(open_db(uri))?;
        runtime.block_on(ensure_table(&db, table_name, build_object_schema(vector_dim)))?;
        Ok(Self { runtime, db, table_name: table_name.to_string(), vector_dim })
    }

    pub fn table_name(&self) -> &str { &self.table_name }

    pub fn count(&self) -> Result<usize> {
        self.runtime.block_on(count_rows(&self.db, &self.table_name))
    }

    fn validate(&self, object: &TargetObject) -> std::result::Result<(), ObjectError> {
        let mut messages = Vec::new();
        if uuid::Uuid::parse_str(&object.id).is_err() {
            messages.push(format!("id '{}' is not a valid UUID", object.id));
        }
        if let Some(vector) = &object.vector {
            if vector.len() != self.vector_dim as usize {
                messages.push(format!("vector has {} dimensions, table expects {}", vector.len(), self.vector_dim));
            }
            if vector.iter().any(|x| !x.is_finite() || x.abs() > f64::from(f32::MAX)) {
                messages.push("vector has a component that is not a finite 32-bit float".to_string());
            }
        }
        if messages.is_empty() { Ok(()) } else { Err(ObjectError { messages }) }
    }

    async fn upsert(&self, objects: &[&TargetObject]) -> Result<()> {
        let batch = self.objects_to_record_batch(objects)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let t = self.db.open_table(&self.table_name).execute().await?;
        let mut mi = t.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        Ok(())
    }

    fn objects_to_record_batch(&self, objects: &[&TargetObject]) -> Result<RecordBatch> {
        let schema = build_object_schema(self.vector_dim);
        let now = Utc::now().timestamp_millis();
        let mut ids = Vec::with_capacity(objects.len());
        let mut tenants = Vec::with_capacity(objects.len());
        let mut properties = Vec::with_capacity(objects.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(objects.len());
        let mut updated = Vec::with_capacity(objects.len());
        for o in objects {
            ids.push(o.id.clone());
            tenants.push(o.tenant.clone());
            properties.push(serde_json::to_string(&o.properties)?);
            vectors.push(o.vector.as_ref().map(|v| v.iter().map(|&x| Some(x as f32)).collect()));
            updated.push(now);
        }
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(tenants)),
                Arc::new(StringArray::from(properties)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), self.vector_dim)),
                Arc::new(TimestampMillisecondArray::from(updated)),
            ],
        )?;
        Ok(batch)
    }
}

impl StoreClient for LanceStore {
    fn submit_batch(&self, objects: &[TargetObject]) -> BatchResult {
        let mut outcomes = Vec::with_capacity(objects.len());
        let mut valid = Vec::with_capacity(objects.len());
        for object in objects {
            match self.validate(object) {
                Ok(()) => valid.push(object),
                Err(error) => outcomes.push(ObjectOutcome::failed(object.id.clone(), error)),
            }
        }
        if !valid.is_empty() {
            self.runtime
                .block_on(self.upsert(&valid))
                .map_err(|e| BatchFailure::new(format!("{e:#}")))?;
        }
        debug!(table = %self.table_name, written = valid.len(), rejected = outcomes.len(), "lance batch applied");
        outcomes.extend(valid.into_iter().map(|o| ObjectOutcome::ok(o.id.clone())));
        Ok(outcomes)
    }
}
