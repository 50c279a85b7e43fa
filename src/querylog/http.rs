//! `/querylogz` HTTP endpoint

use crate::common::QueryLogConfig;
use crate::querylog::logger::{drain, QueryLogger};
use crate::querylog::view::render_querylogz;
use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct QueryLogState {
    pub logger: QueryLogger,
    pub config: Arc<QueryLogConfig>,
}

impl QueryLogState {
    pub fn new(logger: QueryLogger, config: QueryLogConfig) -> Self {
        Self {
            logger,
            config: Arc::new(config),
        }
    }
}

/// `?timeout=<seconds>&limit=<records>`
#[derive(Debug, Default, Deserialize)]
pub struct QuerylogzParams {
    pub timeout: Option<u64>,
    pub limit: Option<usize>,
}

pub fn querylogz_router(state: QueryLogState) -> Router {
    Router::new()
        .route("/querylogz", get(querylogz_handler))
        .with_state(state)
}

/// Streams records published after the request arrived, until the limit is
/// reached or the timeout elapses.
async fn querylogz_handler(
    State(state): State<QueryLogState>,
    Query(params): Query<QuerylogzParams>,
) -> Html<String> {
    let timeout = params
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| state.config.default_timeout());
    let limit = params.limit.unwrap_or(state.config.default_limit);

    let mut rx = state.logger.subscribe();
    let records = drain(&mut rx, limit, timeout).await;
    tracing::debug!(records = records.len(), ?timeout, limit, "serving querylogz");

    Html(render_querylogz(&records, &state.config))
}
