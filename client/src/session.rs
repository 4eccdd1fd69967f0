//! Interval sequencing state machine.
//!
//! [`SessionState`] is the whole mutable state of a Pomodoro session. It is
//! owned by exactly one driver (normally [`IntervalTracker`]) and changed only
//! through the transition methods below, all of which are synchronous and
//! free of I/O:
//!
//! | From | Call | To |
//! |------|------|----|
//! | any | [`start`](SessionState::start) | `Running(kind)` with a fresh interval |
//! | `Running` | [`toggle`](SessionState::toggle) | `Paused` |
//! | `Paused` | [`toggle`](SessionState::toggle) | `Running` |
//! | `Running` | [`tick`](SessionState::tick) | `Running`, one second less |
//! | `Running(Focus)` | final tick | `Running(ShortBreak \| LongBreak)` |
//! | `Running(break)` | final tick | `Running(Focus)` |
//! | `Running`/`Paused` | [`reset`](SessionState::reset) | `Paused`, full duration |
//!
//! There is no terminal state: a session cycles until its owner drops it.
//!
//! [`IntervalTracker`]: crate::tracker::IntervalTracker

use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::types::{Interval, IntervalDurations, IntervalKind, TimeEntry, LONG_BREAK_EVERY};

/// Whether the countdown is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerStatus {
    /// No interval has been started yet.
    #[default]
    Idle,
    Running,
    Paused,
}

/// Outcome of a tick that brought the current interval to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A Focus interval finished naturally.
    Focus {
        /// Entry to hand to the backend. `None` when the interval had no task
        /// to attribute the time to.
        entry: Option<TimeEntry>,
        /// Count after this completion.
        completed_focus_count: u32,
        /// The break that is now running.
        next: IntervalKind,
    },
    /// A break finished and a new Focus interval is now running.
    Break { finished: IntervalKind },
}

/// Exclusively owned state of one Pomodoro session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    status: TimerStatus,
    completed_focus_count: u32,
    current: Option<Interval>,
    durations: IntervalDurations,
    /// Task that Focus intervals are attributed to, including the ones
    /// started automatically after a break.
    task_ref: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(IntervalDurations::default())
    }
}

impl SessionState {
    /// Creates an idle session with no completed intervals.
    #[must_use]
    pub fn new(durations: IntervalDurations) -> Self {
        Self {
            status: TimerStatus::Idle,
            completed_focus_count: 0,
            current: None,
            durations,
            task_ref: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    #[must_use]
    pub fn completed_focus_count(&self) -> u32 {
        self.completed_focus_count
    }

    #[must_use]
    pub fn current(&self) -> Option<&Interval> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn durations(&self) -> IntervalDurations {
        self.durations
    }

    #[must_use]
    pub fn task_ref(&self) -> Option<&str> {
        self.task_ref.as_deref()
    }

    /// Starts a fresh interval of `kind`, replacing any current one.
    ///
    /// A replaced interval is returned and never credited: partially elapsed
    /// Focus time produces no [`TimeEntry`]. `task_ref` becomes the
    /// attribution for this and later Focus intervals; break intervals
    /// themselves never carry one.
    pub fn start(&mut self, kind: IntervalKind, task_ref: Option<String>) -> Option<Interval> {
        let abandoned = self.current.take();
        if let Some(prev) = &abandoned {
            debug!(
                kind = %prev.kind,
                remaining_secs = prev.remaining_secs,
                "Abandoning current interval"
            );
        }

        self.task_ref = task_ref;
        let interval_task = match kind {
            IntervalKind::Focus => self.task_ref.clone(),
            IntervalKind::ShortBreak | IntervalKind::LongBreak => None,
        };
        self.begin(kind, interval_task);

        abandoned
    }

    /// Flips between running and paused, returning the new status.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NoActiveInterval`] if nothing has been started.
    pub fn toggle(&mut self) -> Result<TimerStatus> {
        self.status = match self.status {
            TimerStatus::Idle => return Err(TrackerError::NoActiveInterval),
            TimerStatus::Running => TimerStatus::Paused,
            TimerStatus::Paused => TimerStatus::Running,
        };
        Ok(self.status)
    }

    /// Advances the countdown by one second.
    ///
    /// Does nothing unless running. When the remaining time reaches zero the
    /// interval completes in the same call and the next one starts running.
    pub fn tick(&mut self) -> Option<Completion> {
        if self.status != TimerStatus::Running {
            return None;
        }

        let remaining = {
            let interval = self.current.as_mut()?;
            interval.remaining_secs = interval.remaining_secs.saturating_sub(1);
            interval.remaining_secs
        };
        if remaining > 0 {
            return None;
        }

        let finished = self.current.take()?;
        Some(self.complete(finished))
    }

    /// Restores the full duration of the current interval and pauses it.
    ///
    /// Neither the kind nor the completed count changes.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NoActiveInterval`] if nothing has been started.
    pub fn reset(&mut self) -> Result<()> {
        let interval = self
            .current
            .as_mut()
            .ok_or(TrackerError::NoActiveInterval)?;
        interval.remaining_secs = interval.planned_secs;
        self.status = TimerStatus::Paused;
        Ok(())
    }

    /// Changes the task attribution without touching the countdown.
    ///
    /// A running or paused Focus interval is re-attributed too, so the entry
    /// written on completion names the task selected at that moment.
    pub fn set_task_ref(&mut self, task_ref: Option<String>) {
        if let Some(interval) = self.current.as_mut() {
            if interval.kind == IntervalKind::Focus {
                interval.task_ref.clone_from(&task_ref);
            }
        }
        self.task_ref = task_ref;
    }

    /// Read-only view for display.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let (kind, planned_secs, remaining_secs) = match &self.current {
            Some(interval) => (interval.kind, interval.planned_secs, interval.remaining_secs),
            None => {
                let focus = self.durations.planned_secs(IntervalKind::Focus);
                (IntervalKind::Focus, focus, focus)
            }
        };

        Snapshot {
            status: self.status,
            kind,
            planned_secs,
            remaining_secs,
            completed_focus_count: self.completed_focus_count,
        }
    }

    fn begin(&mut self, kind: IntervalKind, task_ref: Option<String>) {
        let planned = self.durations.planned_secs(kind);
        self.current = Some(Interval::new(kind, planned, task_ref));
        self.status = TimerStatus::Running;
    }

    fn complete(&mut self, finished: Interval) -> Completion {
        match finished.kind {
            IntervalKind::Focus => {
                self.completed_focus_count += 1;
                let next = if self.completed_focus_count % LONG_BREAK_EVERY == 0 {
                    IntervalKind::LongBreak
                } else {
                    IntervalKind::ShortBreak
                };
                let entry = finished
                    .task_ref
                    .map(|task| TimeEntry::pomodoro(task, finished.planned_secs));

                debug!(
                    completed_focus_count = self.completed_focus_count,
                    next = %next,
                    "Focus interval completed"
                );
                self.begin(next, None);

                Completion::Focus {
                    entry,
                    completed_focus_count: self.completed_focus_count,
                    next,
                }
            }
            IntervalKind::ShortBreak | IntervalKind::LongBreak => {
                debug!(finished = %finished.kind, "Break completed");
                self.begin(IntervalKind::Focus, self.task_ref.clone());
                Completion::Break {
                    finished: finished.kind,
                }
            }
        }
    }
}

/// Point-in-time view of a session for rendering.
///
/// Before the first start it describes an untouched default Focus interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub status: TimerStatus,
    pub kind: IntervalKind,
    pub planned_secs: u32,
    pub remaining_secs: u32,
    pub completed_focus_count: u32,
}

impl Snapshot {
    /// Remaining time as `MM:SS`.
    #[must_use]
    pub fn format_remaining(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }

    /// Elapsed share of the planned duration, 0 to 100.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        if self.planned_secs == 0 {
            return 0;
        }
        let elapsed = u64::from(self.planned_secs - self.remaining_secs);
        (elapsed * 100 / u64::from(self.planned_secs)) as u32
    }
}
