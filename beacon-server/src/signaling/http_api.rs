use crate::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use beacon_core::RoomId;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// `POST /api/rooms`: provision a room out of band and return its id.
pub async fn create_room(State(state): State<Arc<AppState>>) -> Response {
    match state.registry.create() {
        Ok((room_id, _)) => Json(json!({ "roomId": room_id })).into_response(),
        Err(e) => {
            error!("room creation failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/rooms/{roomId}`: report the room's id and member count, or
/// 404 if it does not exist (or was reclaimed mid-request).
pub async fn room_info(
    Path(room_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let room_id = RoomId::from(room_id);
    let Some(handle) = state.registry.lookup(&room_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match handle.snapshot().await {
        Ok(summary) => Json(summary).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
