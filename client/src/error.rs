//! Error types for the pomotrack client.
//!
//! This module defines the error taxonomy of the interval tracker. None of
//! these errors are fatal: they are returned to the caller, or in the case of
//! persistence failures during a tick, logged and surfaced as notices.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during tracker operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A Focus interval was requested while tasks exist but none is selected.
    #[error("select a task before starting a focus interval")]
    MissingTaskSelection,

    /// The task reference does not match any active task.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// The operation needs a current interval but the tracker is idle.
    #[error("no active interval")]
    NoActiveInterval,

    /// Writing a time entry failed.
    ///
    /// The interval transition that produced the entry is not rolled back.
    #[error("failed to record time entry: {0}")]
    PersistenceWriteFailed(#[source] BackendError),

    /// Reading tasks or logged entries failed.
    #[error("failed to read from task API: {0}")]
    PersistenceReadFailed(#[source] BackendError),
}

/// A specialized `Result` type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_task_selection_display() {
        let err = TrackerError::MissingTaskSelection;
        assert_eq!(
            err.to_string(),
            "select a task before starting a focus interval"
        );
    }

    #[test]
    fn unknown_task_display() {
        let err = TrackerError::UnknownTask("task_9".to_string());
        assert_eq!(err.to_string(), "unknown task: task_9");
    }

    #[test]
    fn no_active_interval_display() {
        assert_eq!(TrackerError::NoActiveInterval.to_string(), "no active interval");
    }

    #[test]
    fn persistence_write_failed_display() {
        let err = TrackerError::PersistenceWriteFailed(BackendError::AuthFailed);
        assert_eq!(
            err.to_string(),
            "failed to record time entry: authentication failed: missing or expired session"
        );
    }

    #[test]
    fn persistence_read_failed_display() {
        let err = TrackerError::PersistenceReadFailed(BackendError::ServerError {
            status: 503,
            message: "unavailable".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "failed to read from task API: server error: 503 - unavailable"
        );
    }

    #[test]
    fn error_source_chain() {
        use std::error::Error;

        let err = TrackerError::PersistenceWriteFailed(BackendError::AuthFailed);
        assert!(err.source().is_some());
        assert!(TrackerError::NoActiveInterval.source().is_none());
    }

    #[test]
    fn result_type_alias_works() {
        fn example_function() -> Result<u32> {
            Ok(25)
        }

        fn example_error_function() -> Result<u32> {
            Err(TrackerError::MissingTaskSelection)
        }

        assert!(example_function().is_ok());
        assert!(example_error_function().is_err());
    }
}
