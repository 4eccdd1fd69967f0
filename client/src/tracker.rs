//! Interval session tracker.
//!
//! [`IntervalTracker`] owns one [`SessionState`] together with the task list
//! and the [`Backend`] it records completed Focus intervals to. It is the
//! piece a front end drives: call [`start`](IntervalTracker::start),
//! [`toggle`](IntervalTracker::toggle) and [`reset`](IntervalTracker::reset)
//! from user input and [`tick`](IntervalTracker::tick) once per second.
//!
//! # Persistence
//!
//! Time-entry writes run on a spawned task, so [`tick`](IntervalTracker::tick)
//! never waits on the network. The transition to the next interval and the
//! completed count are applied before the write starts and are never rolled
//! back, so a failed write leaves the count ahead of the persisted entries.
//! Each write reports back through
//! [`write_outcome`](IntervalTracker::write_outcome) as
//! [`Notice::EntryRecorded`] or [`Notice::EntryWriteFailed`].
//!
//! # Example
//!
//! ```no_run
//! use pomotrack_client::client::{ApiClient, ApiClientConfig};
//! use pomotrack_client::tracker::IntervalTracker;
//! use pomotrack_client::types::{IntervalDurations, IntervalKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = ApiClient::new(ApiClientConfig::new("http://localhost:8001/api".into())).unwrap();
//!     let mut tracker = IntervalTracker::new(client, IntervalDurations::default());
//!     let _ = tracker.refresh_tasks().await;
//!
//!     tracker.start(IntervalKind::Focus, None).unwrap();
//!     let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
//!     loop {
//!         tokio::select! {
//!             _ = ticker.tick() => {
//!                 if let Some(notice) = tracker.tick() {
//!                     println!("{}", notice.message());
//!                 }
//!             }
//!             Some(notice) = tracker.write_outcome() => println!("{}", notice.message()),
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{Result, TrackerError};
use crate::session::{Completion, SessionState, Snapshot, TimerStatus};
use crate::types::{Interval, IntervalDurations, IntervalKind, Task, TimeEntry};

/// Completed writes that can wait for the front end before senders block.
const WRITE_OUTCOME_BUFFER: usize = 16;

/// User-visible signal produced when an interval completes or a write ends.
#[derive(Debug)]
pub enum Notice {
    /// A Focus interval completed and the break is now running.
    FocusComplete {
        /// Minutes being written to the backend, `None` if there was no task.
        pending_minutes: Option<u32>,
        completed_focus_count: u32,
        /// The break now running.
        next: IntervalKind,
    },

    /// A break completed and a Focus interval is now running.
    BreakComplete { finished: IntervalKind },

    /// A time entry was written.
    EntryRecorded {
        entry: TimeEntry,
        /// Today's total read back after the write, zero if the read failed.
        daily_total_minutes: u32,
    },

    /// A time entry could not be written. It is not retried.
    EntryWriteFailed { entry: TimeEntry, error: TrackerError },
}

impl Notice {
    #[must_use]
    pub fn is_focus_complete(&self) -> bool {
        matches!(self, Self::FocusComplete { .. })
    }

    /// One-line text suitable for a toast or status line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::FocusComplete {
                pending_minutes: Some(minutes),
                next,
                ..
            } => format!("Pomodoro complete! Recording {minutes} minutes. Time for a {next}."),
            Self::FocusComplete {
                pending_minutes: None,
                next,
                ..
            } => format!("Pomodoro complete! Time for a {next}."),
            Self::BreakComplete { .. } => "Break over! Back to work.".to_string(),
            Self::EntryRecorded {
                entry,
                daily_total_minutes,
            } => format!(
                "{} minutes recorded. Today: {daily_total_minutes}m.",
                entry.duration_minutes
            ),
            Self::EntryWriteFailed { entry, error } => format!(
                "{} minutes could not be recorded ({error}).",
                entry.duration_minutes
            ),
        }
    }
}

/// Drives a [`SessionState`] against a task [`Backend`].
pub struct IntervalTracker<B> {
    backend: Arc<B>,
    state: SessionState,
    tasks: Vec<Task>,
    selected_task: Option<String>,
    outcome_tx: mpsc::Sender<Notice>,
    outcome_rx: mpsc::Receiver<Notice>,
}

impl<B: Backend> IntervalTracker<B> {
    /// Creates a tracker with a fresh idle session and no tasks loaded.
    #[must_use]
    pub fn new(backend: B, durations: IntervalDurations) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(WRITE_OUTCOME_BUFFER);
        Self {
            backend: Arc::new(backend),
            state: SessionState::new(durations),
            tasks: Vec::new(),
            selected_task: None,
            outcome_tx,
            outcome_rx,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn selected_task(&self) -> Option<&str> {
        self.selected_task.as_deref()
    }

    /// Reloads the active task list.
    ///
    /// When nothing valid is selected afterwards, the first task becomes the
    /// selection. On a failed read the list degrades to empty, the current
    /// selection is kept, and the error is returned for display.
    ///
    /// # Errors
    ///
    /// [`TrackerError::PersistenceReadFailed`] if the backend read fails.
    pub async fn refresh_tasks(&mut self) -> Result<usize> {
        match self.backend.list_active_tasks().await {
            Ok(tasks) => {
                self.tasks = tasks;
                let selection_valid = self
                    .selected_task
                    .as_deref()
                    .is_some_and(|id| self.contains_task(id));
                if !selection_valid {
                    if let Some(first) = self.tasks.first() {
                        let id = first.task_id.clone();
                        debug!(task_id = %id, "Selecting first active task");
                        self.set_selection(Some(id));
                    }
                }
                info!(tasks = self.tasks.len(), "Task list refreshed");
                Ok(self.tasks.len())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load tasks");
                self.tasks.clear();
                Err(TrackerError::PersistenceReadFailed(e))
            }
        }
    }

    /// Chooses the task that Focus intervals are attributed to.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownTask`] if `task_id` is not an active task.
    pub fn select_task(&mut self, task_id: &str) -> Result<()> {
        if !self.contains_task(task_id) {
            return Err(TrackerError::UnknownTask(task_id.to_string()));
        }
        self.set_selection(Some(task_id.to_string()));
        Ok(())
    }

    /// Starts a fresh interval of `kind`.
    ///
    /// For Focus, `task_ref` must be an active task and becomes the
    /// selection; `None` uses the current selection. Focus intervals need a
    /// task whenever any task exists. Breaks ignore `task_ref`, and the Focus
    /// that follows a break uses the selection. Any interval already running
    /// or paused is abandoned without crediting its elapsed time, and is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::UnknownTask`] if a Focus `task_ref` is not an
    ///   active task
    /// - [`TrackerError::MissingTaskSelection`] if `kind` is Focus, tasks
    ///   exist, and no task is given or selected
    ///
    /// No state changes on error.
    pub fn start(&mut self, kind: IntervalKind, task_ref: Option<&str>) -> Result<Option<Interval>> {
        let task_ref = match task_ref {
            Some(id) if kind.is_break() => {
                debug!(task_id = %id, kind = %kind, "Ignoring task for a break");
                None
            }
            other => other,
        };

        if let Some(id) = task_ref {
            if !self.contains_task(id) {
                return Err(TrackerError::UnknownTask(id.to_string()));
            }
        }

        if kind == IntervalKind::Focus
            && !self.tasks.is_empty()
            && task_ref.is_none()
            && self.selected_task.is_none()
        {
            return Err(TrackerError::MissingTaskSelection);
        }

        if let Some(id) = task_ref {
            self.selected_task = Some(id.to_string());
        }

        let abandoned = self.state.start(kind, self.selected_task.clone());
        if let Some(prev) = &abandoned {
            if prev.kind == IntervalKind::Focus && prev.elapsed_secs() > 0 {
                warn!(
                    elapsed_secs = prev.elapsed_secs(),
                    "Abandoned focus interval was not recorded"
                );
            }
        }

        info!(kind = %kind, task_id = ?self.state.task_ref(), "Interval started");
        Ok(abandoned)
    }

    /// Pauses or resumes the current interval, returning the new status.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NoActiveInterval`] if nothing has been started.
    pub fn toggle(&mut self) -> Result<TimerStatus> {
        let status = self.state.toggle()?;
        debug!(status = ?status, "Timer toggled");
        Ok(status)
    }

    /// Restores the current interval to its full duration and pauses it.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NoActiveInterval`] if nothing has been started.
    pub fn reset(&mut self) -> Result<()> {
        self.state.reset()?;
        debug!("Timer reset");
        Ok(())
    }

    /// Advances one second and handles a completion if one occurs.
    ///
    /// A completed Focus interval with a task is handed to a spawned write
    /// and the notice is returned straight away; the write's result arrives
    /// later through [`write_outcome`](Self::write_outcome).
    ///
    /// # Panics
    ///
    /// Panics if a write has to be spawned outside a Tokio runtime.
    pub fn tick(&mut self) -> Option<Notice> {
        let notice = match self.state.tick()? {
            Completion::Focus {
                entry,
                completed_focus_count,
                next,
            } => {
                let pending_minutes = entry.as_ref().map(|e| e.duration_minutes);
                if let Some(entry) = entry {
                    self.spawn_write(entry);
                }
                Notice::FocusComplete {
                    pending_minutes,
                    completed_focus_count,
                    next,
                }
            }
            Completion::Break { finished } => Notice::BreakComplete { finished },
        };

        info!(notice = %notice.message(), "Interval completed");
        Some(notice)
    }

    /// Waits for the next spawned write to finish.
    ///
    /// Yields one [`Notice::EntryRecorded`] or [`Notice::EntryWriteFailed`]
    /// per written entry, in completion order. Stays pending while no write
    /// is in flight, so it can sit in a `select!` loop.
    pub async fn write_outcome(&mut self) -> Option<Notice> {
        self.outcome_rx.recv().await
    }

    /// Minutes logged today, by the local calendar date.
    ///
    /// Read on every call. A failed read counts as zero.
    pub async fn daily_total_minutes(&self) -> u32 {
        self.total_minutes_on(Local::now().date_naive()).await
    }

    /// Minutes logged on `date`. A failed read counts as zero.
    pub async fn total_minutes_on(&self, date: NaiveDate) -> u32 {
        total_minutes(self.backend.as_ref(), date).await
    }

    fn spawn_write(&self, entry: TimeEntry) {
        let backend = Arc::clone(&self.backend);
        let outcome_tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            let notice = match backend.record_time_entry(&entry).await {
                Ok(()) => {
                    info!(
                        task_id = %entry.task_ref,
                        duration = entry.duration_minutes,
                        "Time entry recorded"
                    );
                    let daily_total_minutes =
                        total_minutes(backend.as_ref(), Local::now().date_naive()).await;
                    Notice::EntryRecorded {
                        entry,
                        daily_total_minutes,
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        task_id = %entry.task_ref,
                        duration = entry.duration_minutes,
                        "Failed to record time entry"
                    );
                    Notice::EntryWriteFailed {
                        entry,
                        error: TrackerError::PersistenceWriteFailed(e),
                    }
                }
            };

            if outcome_tx.send(notice).await.is_err() {
                debug!("Tracker dropped before the write outcome was delivered");
            }
        });
    }

    fn contains_task(&self, task_id: &str) -> bool {
        self.tasks.iter().any(|task| task.task_id == task_id)
    }

    fn set_selection(&mut self, task_id: Option<String>) {
        self.state.set_task_ref(task_id.clone());
        self.selected_task = task_id;
    }
}

async fn total_minutes<B: Backend>(backend: &B, date: NaiveDate) -> u32 {
    match backend.list_time_entries_for_date(date).await {
        Ok(entries) => entries
            .iter()
            .fold(0u32, |sum, entry| sum.saturating_add(entry.duration)),
        Err(e) => {
            warn!(error = %e, date = %date, "Failed to load time entries");
            0
        }
    }
}
