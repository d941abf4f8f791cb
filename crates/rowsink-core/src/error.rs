use thiserror::Error;

use crate::types::FieldType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Record has {actual} fields but the schema declares {expected}")]
    FieldCountMismatch { expected: usize, actual: usize },

    #[error("Field '{field}' has unsupported type {field_type}; convert it before writing")]
    UnsupportedType { field: String, field_type: FieldType },

    #[error("Field '{field}' does not hold a valid UUID: '{value}'")]
    InvalidIdentifier { field: String, value: String },

    #[error("Field '{field}' is not a sequence of numbers: {reason}")]
    InvalidVector { field: String, reason: String },

    #[error("Role field '{0}' does not exist in the schema")]
    UnknownRoleField(String),

    #[error("Partition writer {0} is already closed")]
    WriterClosed(u64),

    #[error("Partition {partition_id} committed incompletely: {rejected} rejected, {unsubmitted} unsubmitted")]
    IncompleteCommit { partition_id: u64, rejected: usize, unsubmitted: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
