//! rowsink-writer
//!
//! The batched-write pipeline: record -> [`ObjectBuilder`] -> object ->
//! [`BatchAccumulator`] -> [`BatchSubmitter`] -> store, driven per data
//! partition by [`PartitionWriter`].

pub mod accumulator;
pub mod builder;
pub mod codec;
pub mod memory;
pub mod partition;
pub mod submitter;

pub use accumulator::{Batch, BatchAccumulator};
pub use builder::ObjectBuilder;
pub use memory::MemoryStore;
pub use partition::{CommitMessage, PartitionWriter, WriterState};
pub use submitter::{BatchSubmitter, RejectedObject, RetryBudget, SubmitReport};
