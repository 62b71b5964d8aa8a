//! Session driver: owns the mission count for the lifetime of one
//! monitoring session, pulls events from the source one at a time, runs the
//! classifier, and dispatches the resulting notifications.

use tokio::time::{timeout, Duration};

use crate::classifier;
use crate::events::JournalEvent;
use crate::journal::EventSource;
use crate::notifier::{Notification, Notifier};

/// Upper bound on one notification dispatch, so a stalled transport cannot
/// stall event ingestion.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// How a session ended. Both outcomes release the source; neither can
/// transition back to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The event stream ended normally (source closed or exhausted).
    Stopped,
    /// Reading the stream failed; a crash notification was attempted.
    Crashed,
}

fn crash_notification() -> Notification {
    Notification::new("edwatch", "edwatch has crashed!")
}

/// Runs one monitoring session to completion.
///
/// The mission count starts at 0 and lives on this task for the whole
/// session; nothing else mutates it. The source is closed on every exit
/// path. Notifier failures are logged and never end the session; only a
/// source failure does.
pub async fn run<S: EventSource, N: Notifier>(source: &mut S, notifier: &N) -> SessionOutcome {
    let mut mission_count: u32 = 0;

    let outcome = loop {
        match source.next().await {
            Some(Ok(event)) => {
                let verdict = classifier::classify(&event, mission_count);
                if verdict.mission_count != mission_count {
                    println!("[session] Active missions: {}", verdict.mission_count);
                }
                mission_count = verdict.mission_count;
                for notification in &verdict.notifications {
                    log_notification(&event, notification);
                    dispatch(notifier, notification).await;
                }
            }
            Some(Err(error)) => {
                eprintln!("[session] Journal stream failed: {error}");
                dispatch(notifier, &crash_notification()).await;
                break SessionOutcome::Crashed;
            }
            None => break SessionOutcome::Stopped,
        }
    };

    source.close();
    outcome
}

/// Operator-visible echo of every dispatched notification, stamped with the
/// event's own timestamp when it carries one.
fn log_notification(event: &JournalEvent, notification: &Notification) {
    match event.timestamp() {
        Some(ts) => println!("[session] {ts} {}: {}", notification.title, notification.body),
        None => println!("[session] {}: {}", notification.title, notification.body),
    }
}

/// Sends one notification with a bounded wait; failures are logged only.
async fn dispatch<N: Notifier>(notifier: &N, notification: &Notification) {
    match timeout(NOTIFY_TIMEOUT, notifier.notify(notification)).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => eprintln!("[notify] Delivery failed: {error}"),
        Err(_) => eprintln!("[notify] Delivery timed out after {NOTIFY_TIMEOUT:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotifierError, SourceError};
    use crate::events::MissionSummary;
    use chrono::{DateTime, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::sleep;

    fn ts() -> DateTime<Utc> {
        "2026-03-04T05:06:07Z".parse().unwrap()
    }

    fn shields_down() -> JournalEvent {
        JournalEvent::ShieldState { shields_up: false, timestamp: ts() }
    }

    fn read_failure() -> SourceError {
        SourceError::Io(std::io::Error::other("journal vanished"))
    }

    /// Scripted in-memory source; counts close calls.
    struct ScriptedSource {
        events: VecDeque<Result<JournalEvent, SourceError>>,
        close_calls: u32,
    }

    impl ScriptedSource {
        fn new(events: Vec<Result<JournalEvent, SourceError>>) -> Self {
            Self { events: events.into(), close_calls: 0 }
        }
    }

    impl EventSource for ScriptedSource {
        async fn next(&mut self) -> Option<Result<JournalEvent, SourceError>> {
            self.events.pop_front()
        }

        fn close(&mut self) {
            self.close_calls += 1;
        }
    }

    /// Records every attempted delivery; optionally fails or stalls them.
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self { sent: Mutex::new(Vec::new()), fail: false, delay: None }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::new() }
        }

        fn stalled(delay: Duration) -> Self {
            Self { delay: Some(delay), ..Self::new() }
        }

        fn titles(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|n| n.title.clone()).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
            self.sent.lock().unwrap().push(notification.clone());
            if let Some(delay) = self.delay {
                sleep(delay).await;
            }
            if self.fail {
                return Err(NotifierError::Rejected {
                    status: reqwest::StatusCode::BAD_REQUEST,
                });
            }
            Ok(())
        }
    }

    // ── normal flow ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn dispatches_in_order_and_stops_on_exhaustion() {
        let mut source = ScriptedSource::new(vec![
            Ok(shields_down()),
            Ok(JournalEvent::CollectCargo { stolen: true }),
            Ok(JournalEvent::Died),
        ]);
        let notifier = RecordingNotifier::new();

        let outcome = run(&mut source, &notifier).await;

        assert_eq!(outcome, SessionOutcome::Stopped);
        assert_eq!(
            notifier.titles(),
            ["Shields Are Down", "Stolen Cargo Collected", "Commander Died"]
        );
        assert_eq!(source.close_calls, 1);
    }

    #[tokio::test]
    async fn silent_events_dispatch_nothing() {
        let mut source = ScriptedSource::new(vec![
            Ok(JournalEvent::Unknown),
            Ok(JournalEvent::ShieldState { shields_up: true, timestamp: ts() }),
            Ok(JournalEvent::MissionAccepted),
        ]);
        let notifier = RecordingNotifier::new();

        let outcome = run(&mut source, &notifier).await;

        assert_eq!(outcome, SessionOutcome::Stopped);
        assert!(notifier.titles().is_empty());
    }

    // ── mission count threading ───────────────────────────────────────────────

    #[tokio::test]
    async fn mission_lifecycle_notifies_once_when_the_last_mission_ends() {
        let mut source = ScriptedSource::new(vec![
            Ok(JournalEvent::MissionAccepted),
            Ok(JournalEvent::MissionAccepted),
            Ok(JournalEvent::MissionAccepted),
            Ok(JournalEvent::MissionFailed),
            Ok(JournalEvent::MissionAbandoned),
            Ok(JournalEvent::MissionRedirected),
        ]);
        let notifier = RecordingNotifier::new();

        run(&mut source, &notifier).await;

        assert_eq!(notifier.titles(), ["All Missions Completed"]);
    }

    #[tokio::test]
    async fn snapshot_resync_feeds_later_decrements() {
        let mut source = ScriptedSource::new(vec![
            Ok(JournalEvent::Missions {
                active: vec![
                    MissionSummary { expires_in_seconds: 3600 },
                    MissionSummary { expires_in_seconds: 7200 },
                ],
            }),
            Ok(JournalEvent::MissionFailed),
            Ok(JournalEvent::MissionFailed),
        ]);
        let notifier = RecordingNotifier::new();

        run(&mut source, &notifier).await;

        // 2 -> 1 silently, then 1 -> 0 notifies; the snapshot itself never does.
        assert_eq!(notifier.titles(), ["All Missions Completed"]);
    }

    // ── failure paths ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn source_error_sends_one_crash_notification_and_closes_once() {
        let mut source = ScriptedSource::new(vec![
            Ok(shields_down()),
            Err(read_failure()),
            Ok(JournalEvent::Died),
        ]);
        let notifier = RecordingNotifier::new();

        let outcome = run(&mut source, &notifier).await;

        assert_eq!(outcome, SessionOutcome::Crashed);
        assert_eq!(notifier.titles(), ["Shields Are Down", "edwatch"]);
        assert_eq!(source.close_calls, 1);
        // Consumption stops at the failure; the trailing event is never read.
        assert_eq!(source.events.len(), 1);
    }

    #[tokio::test]
    async fn notifier_failures_do_not_end_the_session() {
        let mut source = ScriptedSource::new(vec![Ok(shields_down()), Ok(JournalEvent::Died)]);
        let notifier = RecordingNotifier::failing();

        let outcome = run(&mut source, &notifier).await;

        assert_eq!(outcome, SessionOutcome::Stopped);
        assert_eq!(notifier.titles(), ["Shields Are Down", "Commander Died"]);
        assert_eq!(source.close_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_notifier_is_bounded_by_the_dispatch_timeout() {
        let mut source = ScriptedSource::new(vec![Ok(shields_down()), Ok(JournalEvent::Died)]);
        let notifier = RecordingNotifier::stalled(Duration::from_secs(600));

        let outcome = run(&mut source, &notifier).await;

        // Each dispatch gives up after NOTIFY_TIMEOUT; the session still
        // processes every event and ends normally.
        assert_eq!(outcome, SessionOutcome::Stopped);
        assert_eq!(notifier.titles(), ["Shields Are Down", "Commander Died"]);
        assert_eq!(source.close_calls, 1);
    }
}
