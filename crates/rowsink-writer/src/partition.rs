//! Lifecycle of the writes of one data partition.
//!
//! `write` converts and accumulates, flushing synchronously whenever the
//! batch reaches `batch_size`; `commit` flushes the rest and reports what did
//! not make it; `abort` drops pending objects without touching the store.

use std::fmt;

use tracing::{debug, info, warn};

use rowsink_core::config::WriterOptions;
use rowsink_core::error::{Error, Result};
use rowsink_core::traits::StoreClient;
use rowsink_core::types::{ObjectId, Record, RecordSchema};

use crate::accumulator::BatchAccumulator;
use crate::builder::ObjectBuilder;
use crate::submitter::{BatchSubmitter, RejectedObject, RetryBudget, SubmitReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Open,
    Committed,
    Aborted,
}

/// Acknowledgment returned by [`PartitionWriter::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub partition_id: u64,
    /// Objects acknowledged by the store.
    pub written: usize,
    /// Store calls made over the writer's lifetime.
    pub attempts: u32,
    pub rejected: Vec<RejectedObject>,
    /// Ids the store never acknowledged: still pending after whole-batch
    /// failures, or left without an outcome when the retries ran out.
    pub unsubmitted: Vec<ObjectId>,
}

impl CommitMessage {
    pub fn is_complete(&self) -> bool { self.rejected.is_empty() && self.unsubmitted.is_empty() }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition {} committed: {} written in {} calls", self.partition_id, self.written, self.attempts)?;
        if !self.is_complete() {
            write!(f, ", {} rejected, {} unsubmitted", self.rejected.len(), self.unsubmitted.len())?;
        }
        Ok(())
    }
}

pub struct PartitionWriter<S: StoreClient> {
    partition_id: u64,
    options: WriterOptions,
    builder: ObjectBuilder,
    batch: BatchAccumulator,
    submitter: BatchSubmitter<S>,
    state: WriterState,
    written: usize,
    attempts: u32,
    rejected: Vec<RejectedObject>,
    unsubmitted: Vec<ObjectId>,
}

impl<S: StoreClient> PartitionWriter<S> {
    /// Fails if the options are invalid, the schema has an unsupported field,
    /// or a role names a field the schema lacks.
    pub fn new(partition_id: u64, schema: RecordSchema, options: WriterOptions, client: S) -> Result<Self> {
        options.validate()?;
        let builder = ObjectBuilder::new(schema, &options.roles())?.with_tenant(options.tenant.clone());
        debug!(partition_id, class = %options.class_name, batch_size = options.batch_size, "partition writer opened");
        Ok(Self {
            partition_id,
            options,
            builder,
            batch: BatchAccumulator::new(),
            submitter: BatchSubmitter::new(client),
            state: WriterState::Open,
            written: 0,
            attempts: 0,
            rejected: Vec::new(),
            unsubmitted: Vec::new(),
        })
    }

    pub fn state(&self) -> WriterState { self.state }

    pub fn pending(&self) -> usize { self.batch.len() }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        self.ensure_open()?;
        let object = self.builder.build(record)?;
        if self.batch.add(object) >= self.options.batch_size {
            self.flush();
        }
        Ok(())
    }

    pub fn commit(&mut self) -> Result<CommitMessage> {
        self.ensure_open()?;
        self.flush();
        self.state = WriterState::Committed;

        let mut unsubmitted = std::mem::take(&mut self.unsubmitted);
        unsubmitted.extend(self.batch.drain().into_keys());
        let message = CommitMessage {
            partition_id: self.partition_id,
            written: self.written,
            attempts: self.attempts,
            rejected: std::mem::take(&mut self.rejected),
            unsubmitted,
        };
        if message.is_complete() {
            info!(partition_id = self.partition_id, written = message.written, "partition committed");
        } else {
            warn!(
                partition_id = self.partition_id,
                written = message.written,
                rejected = message.rejected.len(),
                unsubmitted = message.unsubmitted.len(),
                "partition committed with missing objects"
            );
            if self.options.fail_on_incomplete {
                return Err(Error::IncompleteCommit {
                    partition_id: self.partition_id,
                    rejected: message.rejected.len(),
                    unsubmitted: message.unsubmitted.len(),
                });
            }
        }
        Ok(message)
    }

    /// Objects already submitted stay in the store.
    pub fn abort(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = WriterState::Aborted;
        let dropped = self.batch.len();
        self.batch.clear();
        info!(partition_id = self.partition_id, written = self.written, dropped, "partition aborted; submitted objects are not rolled back");
        Ok(())
    }

    /// Releases pending objects. Safe to call any number of times; closing an
    /// open writer aborts it.
    pub fn close(&mut self) {
        if self.state == WriterState::Open {
            warn!(partition_id = self.partition_id, "closing a writer that was neither committed nor aborted");
            self.state = WriterState::Aborted;
        }
        self.batch.clear();
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Committed | WriterState::Aborted => Err(Error::WriterClosed(self.partition_id)),
        }
    }

    fn flush(&mut self) {
        let report = self.submitter.submit(
            &mut self.batch,
            RetryBudget::new(self.options.max_retries),
            self.options.backoff(),
        );
        self.absorb(report);
    }

    fn absorb(&mut self, report: SubmitReport) {
        self.written += report.written;
        self.attempts += report.attempts;
        self.rejected.extend(report.rejected);
        self.unsubmitted.extend(report.unsubmitted);
    }
}

impl<S: StoreClient> Drop for PartitionWriter<S> {
    fn drop(&mut self) {
        if self.state == WriterState::Open && !self.batch.is_empty() {
            warn!(partition_id = self.partition_id, pending = self.batch.len(), "writer dropped while open; pending objects discarded");
        }
    }
}
