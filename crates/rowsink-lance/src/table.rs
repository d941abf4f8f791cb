//! LanceDB connection and housekeeping helpers.
//!
//! Database open, ensure/append helpers for tables, and a full-table scan used
//! to read source partitions.

use anyhow::Result;
use arrow_array::{RecordBatch, RecordBatchIterator};
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};
use std::sync::Arc;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.contains(&name.to_string()))
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    Ok(())
}

/// Create `name` from `batches`, or append them if it already exists.
pub async fn append_batches(conn: &Connection, name: &str, batches: Vec<RecordBatch>) -> Result<()> {
    let Some(first) = batches.first() else { return Ok(()) };
    let schema = first.schema();
    let reader = Box::new(RecordBatchIterator::new(batches.into_iter().map(Ok), schema));
    if table_exists(conn, name).await? {
        conn.open_table(name).execute().await?.add(reader).execute().await?;
    } else {
        conn.create_table(name, reader).execute().await?;
    }
    Ok(())
}

/// Full scan of a table as the batches LanceDB yields them.
pub async fn scan_batches(conn: &Connection, name: &str) -> Result<Vec<RecordBatch>> {
    let t = conn.open_table(name).execute().await?;
    let mut stream = t.query().execute().await?;
    let mut batches = Vec::new();
    while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
        if batch.num_rows() > 0 { batches.push(batch); }
    }
    Ok(batches)
}

pub async fn count_rows(conn: &Connection, name: &str) -> Result<usize> {
    if !table_exists(conn, name).await? { return Ok(0); }
    Ok(conn.open_table(name).execute().await?.count_rows(None).await?)
}
