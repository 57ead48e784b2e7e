use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::state::app::AppState;
use crate::state::history::{newer_than, Update};

/// Outcome of one fetch request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Updates newer than the cursor, oldest first.
    Updates(Vec<Update>),
    /// Nothing newer arrived before the watch window closed.
    NoData,
    /// The request was cancelled while parked.
    Cancelled,
}

/// Long-poll for updates on `key` newer than `cursor`.
///
/// History is checked first and answered immediately when something newer
/// is already there. Otherwise the request registers on the hub and races
/// the wake signal against the watch timeout and `cancel`. A wake always
/// triggers a fresh re-read of history. A publish that slips in between
/// the first check and the registration is covered by the timeout, so
/// callers must treat `NoData` as "try again", never "definitely nothing".
pub async fn fetch(
    state: &AppState,
    key: &str,
    cursor: i64,
    watch: Duration,
    cancel: CancellationToken,
) -> FetchOutcome {
    let history = state.store.get_or_create(key);

    let pending = newer_than(&history.snapshot(), cursor);
    if !pending.is_empty() {
        return FetchOutcome::Updates(ascending(pending));
    }

    let mut waiter = state.hub.subscribe(key);
    debug!("long polling, key:{key}, cursor:{cursor}");

    // The waiter unregisters itself on drop, whichever arm wins.
    tokio::select! {
        _ = waiter.wait() => {
            let pending = newer_than(&history.snapshot(), cursor);
            if pending.is_empty() {
                // spurious or racing wake
                FetchOutcome::NoData
            } else {
                debug!("new update(s), key:{key}, num:{}", pending.len());
                FetchOutcome::Updates(ascending(pending))
            }
        }
        _ = tokio::time::sleep(watch) => FetchOutcome::NoData,
        _ = cancel.cancelled() => FetchOutcome::Cancelled,
    }
}

/// Publish `content` under `key` and wake the key's waiters.
///
/// The update is stamped with the current wall clock before any waiter is
/// woken, so a woken reader re-reading history is guaranteed to see it.
/// Without caller content the server announces the update itself.
pub fn publish(state: &AppState, key: &str, content: Option<String>) -> Update {
    let now = Utc::now().timestamp_millis();
    let content =
        content.unwrap_or_else(|| format!("new config is now available:{now}"));

    let history = state.store.get_or_create(key);
    let update = history.record(now, content);
    state.hub.publish(key);

    update
}

/// Oldest-first for the wire, so clients can apply increments in order.
fn ascending(mut updates: Vec<Update>) -> Vec<Update> {
    updates.sort_by_key(|u| u.version);
    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn test_state() -> AppState {
        AppState::new(&AppConfig {
            port: 0,
            log_level: "debug".into(),
            server_version: "test".into(),
            history_capacity: 32,
            default_watch_seconds: 10,
            max_watch_seconds: 60,
        })
    }

    #[tokio::test]
    async fn fetch_returns_existing_updates_immediately() {
        let state = test_state();
        let published = publish(&state, "k", Some("hello".into()));

        let outcome = fetch(
            &state,
            "k",
            0,
            Duration::from_secs(5),
            CancellationToken::new(),
        )
        .await;

        match outcome {
            FetchOutcome::Updates(updates) => {
                assert_eq!(updates.len(), 1);
                assert_eq!(updates[0].version, published.version);
                assert_eq!(updates[0].content, "hello");
            }
            other => panic!("expected updates, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_times_out_on_an_idle_key() {
        let state = test_state();

        let outcome = fetch(
            &state,
            "idle",
            0,
            Duration::from_secs(1),
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, FetchOutcome::NoData));
    }

    #[tokio::test(start_paused = true)]
    async fn parked_fetch_is_woken_by_a_publish() {
        let state = test_state();
        let cursor = publish(&state, "k", None).version;

        let publisher = {
            let state = state.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                publish(&state, "k", Some("second".into()))
            })
        };

        let outcome = fetch(
            &state,
            "k",
            cursor,
            Duration::from_secs(5),
            CancellationToken::new(),
        )
        .await;
        let expected = publisher.await.unwrap();

        match outcome {
            FetchOutcome::Updates(updates) => {
                assert_eq!(updates.len(), 1);
                assert_eq!(updates[0].version, expected.version);
                assert_eq!(updates[0].content, "second");
            }
            other => panic!("expected updates, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_parked_fetch() {
        let state = test_state();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let outcome = fetch(&state, "idle", 0, Duration::from_secs(10), cancel).await;

        assert!(matches!(outcome, FetchOutcome::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn wake_without_newer_data_reports_no_data() {
        let state = test_state();

        // wake the key without appending anything
        let waker = {
            let state = state.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                state.hub.publish("idle");
            })
        };

        let outcome = fetch(
            &state,
            "idle",
            0,
            Duration::from_secs(10),
            CancellationToken::new(),
        )
        .await;
        waker.await.unwrap();

        assert!(matches!(outcome, FetchOutcome::NoData));
    }

    #[tokio::test]
    async fn overflowing_publishes_keep_the_last_capacity_updates() {
        let state = test_state();
        for i in 0..40 {
            publish(&state, "k", Some(format!("update-{i}")));
        }

        let outcome = fetch(
            &state,
            "k",
            0,
            Duration::from_secs(1),
            CancellationToken::new(),
        )
        .await;

        match outcome {
            FetchOutcome::Updates(updates) => {
                assert_eq!(updates.len(), 32);

                // oldest first on the wire, and versions stay strictly
                // increasing even when publishes share a millisecond
                let contents: Vec<&str> =
                    updates.iter().map(|u| u.content.as_str()).collect();
                let expected: Vec<String> =
                    (8..40).map(|i| format!("update-{i}")).collect();
                assert_eq!(
                    contents,
                    expected.iter().map(String::as_str).collect::<Vec<_>>()
                );
                assert!(updates.windows(2).all(|w| w[0].version < w[1].version));
            }
            other => panic!("expected updates, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_without_content_generates_the_announcement() {
        let state = test_state();
        let update = publish(&state, "k", None);

        assert!(update.content.starts_with("new config is now available:"));
    }
}
