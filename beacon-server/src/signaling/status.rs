use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub port: u16,
    pub namespaces: Vec<NamespaceStatus>,
}

#[derive(Debug, Serialize)]
pub struct NamespaceStatus {
    pub name: String,
    pub connected: usize,
}

/// Read-only operational view: the live rooms and their member counts,
/// no payloads.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let namespaces = state
        .relay
        .room_counts()
        .into_iter()
        .map(|(room, connected)| NamespaceStatus {
            name: room.to_string(),
            connected,
        })
        .collect();

    Json(StatusResponse {
        status: "online",
        port: state.relay.config().port,
        namespaces,
    })
}
