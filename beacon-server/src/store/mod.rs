mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use beacon_core::{ClientId, RoomId, RoomSummary};
use std::time::Duration;
use tokio::sync::broadcast;

/// Pluggable persistence/fan-out backend for running several relay
/// instances behind one room namespace.
///
/// The coordinator mirrors membership changes in here best-effort and
/// never depends on it: a single instance is fully correct with no store
/// configured. A Redis implementation would map these onto `SET`/`GET`
/// with expiry, `SADD`/`SREM`/`SMEMBERS` and `PUBLISH`/`SUBSCRIBE`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a room snapshot with an expiry.
    async fn put_room(&self, summary: &RoomSummary, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch a room snapshot, `None` if absent or expired.
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomSummary>, StoreError>;

    /// Add a client to the room's membership set.
    async fn add_member(&self, room_id: &RoomId, client_id: &ClientId) -> Result<(), StoreError>;

    /// Remove a client from the room's membership set.
    async fn remove_member(&self, room_id: &RoomId, client_id: &ClientId)
    -> Result<(), StoreError>;

    /// List the room's membership set.
    async fn members(&self, room_id: &RoomId) -> Result<Vec<ClientId>, StoreError>;

    /// Store a client's opaque session blob with an expiry.
    async fn put_session(
        &self,
        client_id: &ClientId,
        session: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Fetch a client's session blob, `None` if absent or expired.
    async fn get_session(&self, client_id: &ClientId) -> Result<Option<String>, StoreError>;

    /// Publish a serialized frame on the room's event channel.
    async fn publish(&self, room_id: &RoomId, frame: &str) -> Result<(), StoreError>;

    /// Subscribe to the room's event channel.
    async fn subscribe(&self, room_id: &RoomId) -> Result<broadcast::Receiver<String>, StoreError>;
}
