//! Errors surfaced by the tracker core.

use std::sync::Arc;

use super::record::RecordId;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// Bucketing and earliest-time queries need at least one record.
    #[error("No activity has been recorded yet")]
    EmptyHistory,

    #[error("The activity catalog must contain at least one type")]
    EmptyCatalog,

    #[error("Already engaged in {0}")]
    AlreadyEngaged(Arc<str>),

    #[error("No record with id {0}")]
    UnknownRecord(RecordId),

    #[error("Activity can't end before it starts")]
    EndBeforeStart,
}
