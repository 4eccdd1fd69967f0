//! End-to-end tests for the interval tracker against a mock task API.
//!
//! These tests drive [`IntervalTracker`] through full Focus/Break cycles and
//! verify what reaches the API, including behavior when writes or reads fail.

use std::time::{Duration, Instant};

use pomotrack_client::client::{ApiClient, ApiClientConfig};
use pomotrack_client::error::TrackerError;
use pomotrack_client::session::TimerStatus;
use pomotrack_client::tracker::{IntervalTracker, Notice};
use pomotrack_client::types::{IntervalDurations, IntervalKind};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

async fn mount_tasks(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"task_id": "task_1", "title": "Write report", "status": "todo"},
            {"task_id": "task_2", "title": "Review PR", "status": "in_progress"}
        ])))
        .mount(mock_server)
        .await;
}

async fn create_tracker(mock_server: &MockServer) -> IntervalTracker<ApiClient> {
    let config = ApiClientConfig::new(format!("{}/api", mock_server.uri()));
    let client = ApiClient::new(config).expect("client should build");
    let mut tracker = IntervalTracker::new(client, IntervalDurations::default());
    tracker.refresh_tasks().await.expect("tasks should load");
    tracker
}

fn tick_until_notice(tracker: &mut IntervalTracker<ApiClient>) -> Notice {
    loop {
        if let Some(notice) = tracker.tick() {
            return notice;
        }
    }
}

// =============================================================================
// Session Tests
// =============================================================================

/// A full Focus interval produces exactly one 25-minute entry and moves on
/// to a running short break.
#[tokio::test]
async fn test_focus_completion_records_single_entry() {
    let mock_server = MockServer::start().await;
    mount_tasks(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .and(body_json(json!({
            "task_id": "task_1",
            "duration": 25,
            "entry_type": "pomodoro"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tracker = create_tracker(&mock_server).await;
    assert_eq!(tracker.selected_task(), Some("task_1"));

    tracker.start(IntervalKind::Focus, None).unwrap();
    for _ in 0..1499 {
        assert!(tracker.tick().is_none());
    }
    let notice = tracker.tick().expect("1500th tick completes focus");

    assert!(matches!(
        notice,
        Notice::FocusComplete {
            pending_minutes: Some(25),
            completed_focus_count: 1,
            next: IntervalKind::ShortBreak,
        }
    ));

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.status, TimerStatus::Running);
    assert_eq!(snapshot.kind, IntervalKind::ShortBreak);
    assert_eq!(snapshot.remaining_secs, 300);

    let outcome = tracker.write_outcome().await.expect("write outcome");
    assert!(matches!(outcome, Notice::EntryRecorded { .. }));
}

/// A slow API does not hold up the tick that completes a Focus interval.
#[tokio::test]
async fn test_slow_write_does_not_block_tick() {
    let mock_server = MockServer::start().await;
    mount_tasks(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tracker = create_tracker(&mock_server).await;
    tracker.start(IntervalKind::Focus, None).unwrap();
    for _ in 0..1499 {
        tracker.tick();
    }

    let started = Instant::now();
    let notice = tracker.tick().expect("focus completes");
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(notice.is_focus_complete());

    // The break counts down while the write is in flight.
    assert!(tracker.tick().is_none());
    assert_eq!(tracker.snapshot().remaining_secs, 299);

    let outcome = tracker.write_outcome().await.expect("write outcome");
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(matches!(
        outcome,
        Notice::EntryRecorded { ref entry, .. } if entry.task_ref == "task_1"
    ));
}

/// A task given with a break is ignored; the following Focus interval is
/// written against the selected task.
#[tokio::test]
async fn test_break_task_reference_is_not_recorded() {
    let mock_server = MockServer::start().await;
    mount_tasks(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .and(body_json(json!({
            "task_id": "task_1",
            "duration": 25,
            "entry_type": "pomodoro"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tracker = create_tracker(&mock_server).await;
    tracker.start(IntervalKind::ShortBreak, Some("ghost")).unwrap();

    assert!(matches!(
        tick_until_notice(&mut tracker),
        Notice::BreakComplete { .. }
    ));
    assert!(tick_until_notice(&mut tracker).is_focus_complete());

    let outcome = tracker.write_outcome().await.expect("write outcome");
    assert!(matches!(
        outcome,
        Notice::EntryRecorded { ref entry, .. } if entry.task_ref == "task_1"
    ));
}

/// Four Focus intervals cycle through three short breaks and one long break,
/// with one entry per Focus interval.
#[tokio::test]
async fn test_four_cycles_end_in_long_break() {
    let mock_server = MockServer::start().await;
    mount_tasks(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(201))
        .expect(4)
        .mount(&mock_server)
        .await;

    let mut tracker = create_tracker(&mock_server).await;
    tracker.start(IntervalKind::Focus, Some("task_2")).unwrap();

    let mut breaks = Vec::new();
    for _ in 0..4 {
        match tick_until_notice(&mut tracker) {
            Notice::FocusComplete { next, .. } => breaks.push(next),
            other => panic!("expected focus completion, got {other:?}"),
        }
        let snapshot = tracker.snapshot();
        let expected_secs = if snapshot.kind == IntervalKind::LongBreak { 900 } else { 300 };
        assert_eq!(snapshot.remaining_secs, expected_secs);

        let notice = tick_until_notice(&mut tracker);
        assert!(matches!(notice, Notice::BreakComplete { .. }));
    }

    for _ in 0..4 {
        let outcome = tracker.write_outcome().await.expect("write outcome");
        assert!(matches!(outcome, Notice::EntryRecorded { .. }));
    }

    assert_eq!(
        breaks,
        vec![
            IntervalKind::ShortBreak,
            IntervalKind::ShortBreak,
            IntervalKind::ShortBreak,
            IntervalKind::LongBreak,
        ]
    );
    assert_eq!(tracker.state().completed_focus_count(), 4);
    assert_eq!(tracker.snapshot().kind, IntervalKind::Focus);
}

/// A rejected write is reported but the session still moves to the break and
/// counts the interval.
#[tokio::test]
async fn test_failed_write_does_not_roll_back() {
    let mock_server = MockServer::start().await;
    mount_tasks(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tracker = create_tracker(&mock_server).await;
    tracker.start(IntervalKind::Focus, None).unwrap();

    let notice = tick_until_notice(&mut tracker);
    assert!(matches!(
        notice,
        Notice::FocusComplete {
            completed_focus_count: 1,
            next: IntervalKind::ShortBreak,
            ..
        }
    ));

    let outcome = tracker.write_outcome().await.expect("write outcome");
    assert!(matches!(
        outcome,
        Notice::EntryWriteFailed {
            error: TrackerError::PersistenceWriteFailed(_),
            ..
        }
    ));
    assert_eq!(tracker.state().completed_focus_count(), 1);
    assert!(tracker.state().is_running());
    assert_eq!(tracker.snapshot().kind, IntervalKind::ShortBreak);
}

/// Restarting mid-focus sends nothing for the abandoned interval.
#[tokio::test]
async fn test_restart_mid_focus_sends_nothing() {
    let mock_server = MockServer::start().await;
    mount_tasks(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut tracker = create_tracker(&mock_server).await;
    tracker.start(IntervalKind::Focus, None).unwrap();
    for _ in 0..700 {
        assert!(tracker.tick().is_none());
    }
    assert_eq!(tracker.snapshot().remaining_secs, 800);

    tracker.start(IntervalKind::ShortBreak, None).unwrap();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.kind, IntervalKind::ShortBreak);
    assert_eq!(snapshot.remaining_secs, 300);
    assert_eq!(snapshot.completed_focus_count, 0);
}

/// The daily total sums today's entries and falls back to zero on error.
#[tokio::test]
async fn test_daily_total_reads_and_degrades() {
    let mock_server = MockServer::start().await;
    mount_tasks(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"duration": 25},
            {"duration": 25},
            {"duration": 5}
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let tracker = create_tracker(&mock_server).await;

    assert_eq!(tracker.daily_total_minutes().await, 55);
    assert_eq!(tracker.daily_total_minutes().await, 0);
}

/// A failed task read leaves no tasks, so focus can start unattributed and
/// completes without writing.
#[tokio::test]
async fn test_task_read_failure_allows_unattributed_focus() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = ApiClientConfig::new(format!("{}/api", mock_server.uri()));
    let client = ApiClient::new(config).expect("client should build");
    let mut tracker = IntervalTracker::new(client, IntervalDurations::default());

    let result = tracker.refresh_tasks().await;
    assert!(matches!(result, Err(TrackerError::PersistenceReadFailed(_))));
    assert!(tracker.tasks().is_empty());

    tracker.start(IntervalKind::Focus, None).unwrap();
    let notice = tick_until_notice(&mut tracker);
    assert!(matches!(
        notice,
        Notice::FocusComplete {
            pending_minutes: None,
            ..
        }
    ));
}
