//! Interval and time-entry types for pomotrack.
//!
//! This module defines the value types shared between the session state
//! machine and the task API. Wire types serialize to the snake_case JSON
//! the API speaks.

use serde::{Deserialize, Serialize};

/// Default Focus interval length (25 minutes).
pub const DEFAULT_FOCUS_SECS: u32 = 25 * 60;

/// Default short break length (5 minutes).
pub const DEFAULT_SHORT_BREAK_SECS: u32 = 5 * 60;

/// Default long break length (15 minutes).
pub const DEFAULT_LONG_BREAK_SECS: u32 = 15 * 60;

/// Every Nth completed Focus interval is followed by a long break.
pub const LONG_BREAK_EVERY: u32 = 4;

/// Classification of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl IntervalKind {
    /// Returns true for both break kinds.
    #[must_use]
    pub fn is_break(self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }

    /// Short human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short break",
            Self::LongBreak => "long break",
        }
    }
}

impl std::fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Planned length of each interval kind, in seconds.
///
/// All three values are positive; [`crate::config::Config`] enforces this
/// for user-supplied overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalDurations {
    pub focus_secs: u32,
    pub short_break_secs: u32,
    pub long_break_secs: u32,
}

impl Default for IntervalDurations {
    fn default() -> Self {
        Self {
            focus_secs: DEFAULT_FOCUS_SECS,
            short_break_secs: DEFAULT_SHORT_BREAK_SECS,
            long_break_secs: DEFAULT_LONG_BREAK_SECS,
        }
    }
}

impl IntervalDurations {
    /// Returns the planned duration for `kind`.
    #[must_use]
    pub fn planned_secs(&self, kind: IntervalKind) -> u32 {
        match kind {
            IntervalKind::Focus => self.focus_secs,
            IntervalKind::ShortBreak => self.short_break_secs,
            IntervalKind::LongBreak => self.long_break_secs,
        }
    }
}

/// The interval currently being counted down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub kind: IntervalKind,

    /// Fixed when the interval starts.
    pub planned_secs: u32,

    /// Always within `0..=planned_secs`.
    pub remaining_secs: u32,

    /// Task the interval is attributed to. Only meaningful for Focus.
    pub task_ref: Option<String>,
}

impl Interval {
    /// Creates a fresh interval with the full planned duration remaining.
    #[must_use]
    pub fn new(kind: IntervalKind, planned_secs: u32, task_ref: Option<String>) -> Self {
        Self {
            kind,
            planned_secs,
            remaining_secs: planned_secs,
            task_ref,
        }
    }

    /// Seconds already counted down.
    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.planned_secs - self.remaining_secs
    }
}

/// Kind of a written time entry. Entries logged by hand elsewhere are only
/// read back as [`LoggedEntry`] durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Pomodoro,
}

/// A completed Focus interval, as written to the time-entry endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    #[serde(rename = "task_id")]
    pub task_ref: String,

    /// Planned interval length in whole minutes.
    #[serde(rename = "duration")]
    pub duration_minutes: u32,

    pub entry_type: EntryType,
}

impl TimeEntry {
    /// Builds the entry for a completed Focus interval of `planned_secs`.
    #[must_use]
    pub fn pomodoro(task_ref: String, planned_secs: u32) -> Self {
        Self {
            task_ref,
            duration_minutes: planned_secs / 60,
            entry_type: EntryType::Pomodoro,
        }
    }
}

/// A task as listed by the task API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A logged entry as returned by the per-date listing.
///
/// Only the duration is needed for the daily total; other fields the API
/// returns are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEntry {
    /// Minutes.
    #[serde(default)]
    pub duration: u32,
}
