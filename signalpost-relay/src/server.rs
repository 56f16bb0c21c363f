//! HTTP boundary of the relay.
//!
//! One signaling resource at `/`:
//!
//! - `POST /` sends a signaling message (JSON body).
//! - `GET /?userId=…` polls and drains the caller's queue.
//! - `OPTIONS /` answers browser preflights with permissive CORS headers.
//! - anything else, `HEAD` included, is `405 Method Not Allowed`.
//!
//! Plus `GET /stats` (resource counters) and `GET /health`.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::Value;
use signalpost_proto::api::{Ack, JoinResponse, PollQuery, PollResponse};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::relay::{RelayService, SignalOutcome};

/// Default maximum accepted request body in bytes (64 KB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Methods advertised to preflight requests.
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Request headers advertised to preflight requests.
const ALLOWED_HEADERS: &str = "Content-Type, X-User-Id";

/// How long browsers may cache a preflight answer, in seconds.
const PREFLIGHT_MAX_AGE: &str = "86400";

/// Handle returned by the `start_server*` functions.
pub type ServerHandle = (std::net::SocketAddr, tokio::task::JoinHandle<()>);

/// Builds the relay router around a shared service.
pub fn router(service: Arc<RelayService>, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/",
            post(send_handler)
                .get(poll_handler)
                .options(preflight_handler)
                // A GET route would otherwise answer HEAD and drain the queue.
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(service)
}

/// Starts the relay on the given address with default limits and returns
/// the bound address and a join handle.
///
/// This is the entry point used by tests; pass `127.0.0.1:0` to get an
/// OS-assigned port.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(addr: &str) -> Result<ServerHandle, Box<dyn std::error::Error + Send + Sync>> {
    start_server_with_state(addr, Arc::new(RelayService::new()), DEFAULT_MAX_BODY_SIZE).await
}

/// Starts the relay as described by a resolved [`RelayConfig`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the configured address.
pub async fn start_server_with_config(
    config: &RelayConfig,
) -> Result<ServerHandle, Box<dyn std::error::Error + Send + Sync>> {
    let service = Arc::new(RelayService::from_config(config));
    start_server_with_state(&config.bind_addr, service, config.max_body_size).await
}

/// Starts the relay around a pre-built [`RelayService`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    service: Arc<RelayService>,
    max_body_size: usize,
) -> Result<ServerHandle, Box<dyn std::error::Error + Send + Sync>> {
    let app = router(service, max_body_size);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "relay server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Renders a 200 JSON body with the wildcard CORS origin every reply carries.
fn json_ok<T: Serialize>(body: T) -> Response {
    (
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(body),
    )
        .into_response()
}

/// `POST /`: validate and apply one signaling message.
///
/// The body is parsed as JSON whatever its `Content-Type`, since browsers
/// send `text/plain` to skip the preflight. An empty body reads as `{}`.
async fn send_handler(
    State(service): State<Arc<RelayService>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    let body = body.map_err(|rejection| {
        tracing::warn!(status = %rejection.status(), "rejected request body");
        RelayError::BodyRejected {
            status: rejection.status(),
            reason: rejection.body_text(),
        }
    })?;
    let value: Value = if body.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "rejected malformed request body");
            RelayError::MalformedBody(e.to_string())
        })?
    };

    let response = match service.handle_value(value).await? {
        SignalOutcome::Joined { participants } => json_ok(JoinResponse::new(participants)),
        SignalOutcome::Accepted => json_ok(Ack::OK),
    };
    Ok(response)
}

/// `GET /?userId=…`: drain the caller's queue.
async fn poll_handler(
    State(service): State<Arc<RelayService>>,
    query: Result<Query<PollQuery>, QueryRejection>,
) -> Result<Response, RelayError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejected poll query");
        RelayError::InvalidQuery(rejection.body_text())
    })?;
    let user_id = query.user_id.as_deref().unwrap_or_default();
    let messages = service.poll(user_id).await?;
    Ok(json_ok(PollResponse { messages }))
}

/// `OPTIONS /`: permissive CORS preflight with an empty body.
async fn preflight_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
            (header::ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE),
        ],
    )
}

async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

/// `GET /stats`: room and queue counters.
async fn stats_handler(State(service): State<Arc<RelayService>>) -> Response {
    json_ok(service.stats().await)
}
