use beacon_core::RoomId;
use thiserror::Error;

/// Errors from the room registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A generated room id landed on an existing room. With 48 bits of
    /// entropy this is effectively unreachable, but creation must never
    /// overwrite a live room.
    #[error("generated room id {0} already exists")]
    IdCollision(RoomId),
}

/// The room's command loop has exited; its handle is stale.
#[derive(Debug, Error)]
#[error("room no longer exists")]
pub struct RoomGone;

/// Errors from a session store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
