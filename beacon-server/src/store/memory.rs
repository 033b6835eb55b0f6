use crate::error::StoreError;
use crate::store::SessionStore;
use async_trait::async_trait;
use beacon_core::{ClientId, RoomId, RoomSummary};
use dashmap::DashMap;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Capacity of each room's event channel. Slow subscribers lag and drop,
/// they never block publishers.
const EVENT_CHANNEL_DEPTH: usize = 64;

/// In-process [`SessionStore`]. Single-instance stand-in for a real
/// backend; also what the test suite runs against.
#[derive(Default)]
pub struct MemoryStore {
    rooms: DashMap<RoomId, (RoomSummary, Instant)>,
    members: DashMap<RoomId, HashSet<ClientId>>,
    sessions: DashMap<ClientId, (String, Instant)>,
    channels: DashMap<RoomId, broadcast::Sender<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, room_id: &RoomId) -> broadcast::Sender<String> {
        self.channels
            .entry(room_id.clone())
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_DEPTH).0)
            .clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put_room(&self, summary: &RoomSummary, ttl: Duration) -> Result<(), StoreError> {
        self.rooms
            .insert(summary.id.clone(), (summary.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomSummary>, StoreError> {
        let Some(entry) = self.rooms.get(room_id) else {
            return Ok(None);
        };
        let (summary, expires_at) = entry.value();
        if *expires_at <= Instant::now() {
            drop(entry);
            self.rooms.remove(room_id);
            return Ok(None);
        }
        Ok(Some(summary.clone()))
    }

    async fn add_member(&self, room_id: &RoomId, client_id: &ClientId) -> Result<(), StoreError> {
        self.members
            .entry(room_id.clone())
            .or_default()
            .insert(client_id.clone());
        Ok(())
    }

    async fn remove_member(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> Result<(), StoreError> {
        if let Some(mut set) = self.members.get_mut(room_id) {
            set.remove(client_id);
        }
        Ok(())
    }

    async fn members(&self, room_id: &RoomId) -> Result<Vec<ClientId>, StoreError> {
        Ok(self
            .members
            .get(room_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn put_session(
        &self,
        client_id: &ClientId,
        session: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.sessions
            .insert(client_id.clone(), (session.to_owned(), Instant::now() + ttl));
        Ok(())
    }

    async fn get_session(&self, client_id: &ClientId) -> Result<Option<String>, StoreError> {
        let Some(entry) = self.sessions.get(client_id) else {
            return Ok(None);
        };
        let (session, expires_at) = entry.value();
        if *expires_at <= Instant::now() {
            drop(entry);
            self.sessions.remove(client_id);
            return Ok(None);
        }
        Ok(Some(session.clone()))
    }

    async fn publish(&self, room_id: &RoomId, frame: &str) -> Result<(), StoreError> {
        // A send error only means nobody is subscribed right now.
        let _ = self.channel(room_id).send(frame.to_owned());
        Ok(())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<broadcast::Receiver<String>, StoreError> {
        Ok(self.channel(room_id).subscribe())
    }
}
