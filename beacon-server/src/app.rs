use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};

use beacon_core::RelayError;

use crate::signaling::{
    RelayService, post_signal_handler, sse_handler, status_handler, ws_handler,
};

pub struct AppState {
    pub relay: Arc<RelayService>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/rooms/{room}/sse", get(sse_handler))
        .route("/rooms/{room}/message", post(post_signal_handler))
        .route("/socket", get(ws_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Maps relay errors onto HTTP statuses at the adapter boundary.
pub struct ApiError(RelayError);

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RelayError::NotFound(_) => StatusCode::NOT_FOUND,
            RelayError::InvalidState { .. } => StatusCode::CONFLICT,
            RelayError::Forbidden(..) => StatusCode::FORBIDDEN,
            RelayError::BridgeUnavailable(_) => StatusCode::BAD_GATEWAY,
        };
        (status, self.0.to_string()).into_response()
    }
}
