//! rowsink-lance
//!
//! LanceDB plumbing for the writer: a `StoreClient` that upserts objects into a
//! Lance table, plus the adapter that turns Arrow batches into writer input.

pub mod schema;
pub mod source;
pub mod store;
pub mod table;

pub use store::LanceStore;
