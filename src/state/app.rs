use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::state::history::HistoryStore;
use crate::state::hub::Hub;

/// In-memory shared application state.
///
/// Handlers receive a clone; the store and hub share their contents across
/// clones, so every request sees the same histories and wait points.
#[derive(Clone)]
pub struct AppState {
    pub store: HistoryStore,
    pub hub: Hub,

    /// Cancelled on shutdown; parked long-polls resolve as cancelled
    /// instead of running out their watch windows.
    pub shutdown: CancellationToken,

    /// Long-poll wait applied when the client sends no usable `watch`.
    pub default_watch: Duration,
    /// Upper clamp on client-requested `watch` windows.
    pub max_watch: Duration,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            store: HistoryStore::new(cfg.history_capacity),
            hub: Hub::new(),
            shutdown: CancellationToken::new(),
            default_watch: Duration::from_secs(cfg.default_watch_seconds),
            max_watch: Duration::from_secs(cfg.max_watch_seconds),
        }
    }
}
