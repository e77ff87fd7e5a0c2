//! Notification side channel for session boundaries.
//!
//! Permission handling and platform delivery belong to the embedding
//! application; the core only hands a `(title, body)` pair to a sink.
//! The production sink here logs, which is what a headless run wants,
//! and the mock records calls for assertions.

use std::sync::Mutex;

use tracing::info;

use crate::types::{SessionBoundary, TimerMode};

/// Title used for every timer notification.
pub const NOTIFICATION_TITLE: &str = "zeropamine";

// ============================================================================
// NotificationSink
// ============================================================================

/// Delivers a short notification to the user. Best-effort; never fails.
pub trait NotificationSink: Send {
    /// Shows a notification with the given title and body.
    fn notify(&self, title: &str, body: &str);
}

/// Shared sinks work too; tests keep a handle to what the runtime owns.
impl<S> NotificationSink for std::sync::Arc<S>
where
    S: NotificationSink + Send + Sync,
{
    fn notify(&self, title: &str, body: &str) {
        (**self).notify(title, body);
    }
}

/// Builds the notification body describing a session boundary.
pub fn boundary_body(boundary: &SessionBoundary) -> &'static str {
    match boundary.next_mode {
        TimerMode::Focus => "休憩が終わりました。集中の時間です!",
        TimerMode::Break => "集中時間が終わりました。休憩しましょう!",
    }
}

// ============================================================================
// LogNotificationSink
// ============================================================================

/// Sink that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, title: &str, body: &str) {
        info!("{}: {}", title, body);
    }
}

// ============================================================================
// MockNotificationSink
// ============================================================================

/// Recording sink for tests.
#[derive(Debug, Default)]
pub struct MockNotificationSink {
    calls: Mutex<Vec<(String, String)>>,
}

impl MockNotificationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(title, body)` pair delivered so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the number of notifications delivered.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl NotificationSink for MockNotificationSink {
    fn notify(&self, title: &str, body: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(next_mode: TimerMode) -> SessionBoundary {
        SessionBoundary {
            finished_mode: next_mode.opposite(),
            next_mode,
            auto_started: false,
        }
    }

    #[test]
    fn test_boundary_body_into_break() {
        let body = boundary_body(&boundary(TimerMode::Break));
        assert!(body.contains("休憩"));
        assert!(body.contains("集中時間が終わりました"));
    }

    #[test]
    fn test_boundary_body_into_focus() {
        let body = boundary_body(&boundary(TimerMode::Focus));
        assert!(body.contains("集中の時間"));
    }

    #[test]
    fn test_mock_records_calls() {
        let sink = MockNotificationSink::new();
        assert_eq!(sink.call_count(), 0);

        sink.notify(NOTIFICATION_TITLE, "hello");
        sink.notify(NOTIFICATION_TITLE, "world");

        assert_eq!(sink.call_count(), 2);
        let calls = sink.calls();
        assert_eq!(calls[0], ("zeropamine".to_string(), "hello".to_string()));
        assert_eq!(calls[1].1, "world");
    }

    #[test]
    fn test_log_sink_does_not_panic() {
        LogNotificationSink.notify(NOTIFICATION_TITLE, "body");
    }
}
