//! Contract with the external task API.
//!
//! The tracker only needs three calls from the backend: the active task list,
//! a time-entry write, and the entries logged on a given date. [`Backend`]
//! captures exactly those so the tracker can be driven by the HTTP
//! [`ApiClient`](crate::client::ApiClient) or by an in-memory double in tests.

use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{LoggedEntry, Task, TimeEntry};

/// Errors returned by a [`Backend`].
#[derive(Error, Debug)]
pub enum BackendError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API rejected the session (401).
    #[error("authentication failed: missing or expired session")]
    AuthFailed,

    /// The API returned a non-success status.
    #[error("server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// The session token contains characters not allowed in a header.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// The task API as seen by the interval tracker.
///
/// Implementations are shared with spawned write tasks, hence `'static`.
pub trait Backend: Send + Sync + 'static {
    /// Lists tasks that are still open (to do or in progress).
    fn list_active_tasks(&self) -> impl Future<Output = Result<Vec<Task>, BackendError>> + Send;

    /// Records one completed Focus interval.
    fn record_time_entry(
        &self,
        entry: &TimeEntry,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Lists entries logged on `date`.
    fn list_time_entries_for_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<LoggedEntry>, BackendError>> + Send;
}
