//! Request-level errors and their HTTP rendering.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use signalpost_proto::SignalError;
use signalpost_proto::api::ErrorResponse;

/// Errors that terminate a single relay request.
///
/// None of these touch relay state: validation happens before any store is
/// written, so a rejected request leaves rooms and queues as they were.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The signaling body failed validation.
    #[error(transparent)]
    Signal(#[from] SignalError),

    /// The request body was not JSON at all.
    #[error("invalid JSON body: {0}")]
    MalformedBody(String),

    /// A poll arrived without a `userId` query parameter.
    #[error("userId required")]
    MissingUserId,

    /// The query string could not be decoded, e.g. a repeated `userId`.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// The body could not be read, e.g. it exceeds the configured limit.
    #[error("{reason}")]
    BodyRejected {
        /// Status reported by the body extractor.
        status: StatusCode,
        /// Extractor's explanation.
        reason: String,
    },

    /// The HTTP method is not served on this resource.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl RelayError {
    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Signal(_)
            | Self::MalformedBody(_)
            | Self::MissingUserId
            | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::BodyRejected { status, .. } => *status,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.to_string());
        (
            self.status(),
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
            Json(body),
        )
            .into_response()
    }
}
