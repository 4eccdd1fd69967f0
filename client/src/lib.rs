//! pomotrack - Pomodoro interval tracker for the task API.
//!
//! This crate provides a client-side Pomodoro session tracker that alternates
//! Focus and Break intervals and records each completed Focus interval as a
//! time entry in the task API.
//!
//! # Overview
//!
//! A session cycles Focus (25 min) → short break (5 min) → Focus, with every
//! fourth completed Focus followed by a long break (15 min) instead. The
//! session state lives in memory only; the task API keeps the time entries,
//! from which the daily total is read back.
//!
//! # Modules
//!
//! - [`types`]: Interval, task, and time-entry types
//! - [`session`]: Pure interval-sequencing state machine
//! - [`backend`]: Contract with the task API
//! - [`client`]: HTTP implementation of the backend contract
//! - [`tracker`]: Session driver that ties the state machine to a backend
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for tracker operations

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod tracker;
pub mod types;

pub use backend::{Backend, BackendError};
pub use client::{ApiClient, ApiClientConfig};
pub use config::{Config, ConfigError};
pub use error::{Result, TrackerError};
pub use session::{Completion, SessionState, Snapshot, TimerStatus};
pub use tracker::{IntervalTracker, Notice};
pub use types::{EntryType, Interval, IntervalDurations, IntervalKind, LoggedEntry, Task, TimeEntry};
