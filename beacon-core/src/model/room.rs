use crate::model::ids::RoomId;
use serde::{Deserialize, Serialize};

/// Read-only view of a room, as reported by the room-info endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub client_count: usize,
}
