use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::errors::LarkError;
use crate::services::update_service::{self, FetchOutcome};
use crate::state::app::AppState;

/// Build the update routes (long-poll fetch + publish).
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/updates", get(fetch_updates))
        .route("/send", post(publish_update))
        .with_state(state)
}

/// Raw query parameters for a fetch.
///
/// Parsing is deliberately lenient: bad values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Deserialize)]
struct FetchParams {
    key: Option<String>,
    version: Option<String>,
    watch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishParams {
    key: Option<String>,
    content: Option<String>,
}

//
// ─────────────────────────────────────────────────────────────
// GET /updates?key=…&version=…&watch=…
// Long-poll for updates newer than `version`
// ─────────────────────────────────────────────────────────────
//
async fn fetch_updates(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Response, LarkError> {
    let key = params.key.unwrap_or_default();
    let cursor = params
        .version
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    let watch = watch_window(&state, params.watch.as_deref());

    tracing::debug!("query parameters, key:{key}, cursor:{cursor}, watch:{watch:?}");

    let outcome =
        update_service::fetch(&state, &key, cursor, watch, state.shutdown.clone()).await;

    match outcome {
        FetchOutcome::Updates(updates) => {
            let body = serde_json::to_string(&updates)?;
            Ok((
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response())
        }
        FetchOutcome::NoData => Ok(StatusCode::NO_CONTENT.into_response()),
        FetchOutcome::Cancelled => Err(LarkError::Cancelled),
    }
}

//
// ─────────────────────────────────────────────────────────────
// POST /send?key=…&content=…
// Publish an update and wake the key's waiters
// ─────────────────────────────────────────────────────────────
//
async fn publish_update(
    State(state): State<AppState>,
    Query(params): Query<PublishParams>,
) -> &'static str {
    let key = params.key.unwrap_or_default();

    let update = update_service::publish(&state, &key, params.content);
    tracing::info!("published version {} on key {:?}", update.version, key);

    "ok"
}

/// Watch window from the raw query value.
///
/// Absent, unparsable, zero and negative all mean the configured default;
/// oversized requests are clamped.
fn watch_window(state: &AppState, raw: Option<&str>) -> Duration {
    let seconds = raw.and_then(|w| w.parse::<i64>().ok()).unwrap_or(0);
    if seconds <= 0 {
        state.default_watch
    } else {
        Duration::from_secs(seconds as u64).min(state.max_watch)
    }
}
