use crate::room::{DeliveryHandle, RoomHandle, RoomRegistry};
use beacon_core::{ClientId, RoomId, SignalMessage};
use std::collections::HashMap;
use tracing::{debug, warn};

/// How many times a join retries after racing a room whose idle grace
/// fired between lookup and enqueue.
const JOIN_RETRIES: usize = 3;

/// Per-connection state the gateway threads through the router: the
/// outbound delivery channel plus which rooms this connection joined, so
/// a dropped socket can be translated into Disconnects.
pub struct Connection {
    delivery: DeliveryHandle,
    joined: HashMap<RoomId, (ClientId, RoomHandle)>,
}

impl Connection {
    pub fn new(delivery: DeliveryHandle) -> Self {
        Self {
            delivery,
            joined: HashMap::new(),
        }
    }

    /// Enqueue a Disconnect for every room this connection joined. Room
    /// state is only ever updated through the rooms' own queues, never
    /// directly from the connection's task.
    pub async fn leave_all(&mut self) {
        for (_, (client_id, handle)) in self.joined.drain() {
            let _ = handle.disconnect(client_id).await;
        }
    }
}

/// Stateless dispatch: inspects the frame type and forwards to the
/// registry or the target room's queue.
#[derive(Clone)]
pub struct MessageRouter {
    registry: RoomRegistry,
}

impl MessageRouter {
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }

    pub async fn dispatch(&self, msg: SignalMessage, conn: &mut Connection) {
        match msg {
            SignalMessage::JoinRoom {
                room_id,
                client_id,
                client_name,
            } => self.handle_join(room_id, client_id, client_name, conn).await,

            SignalMessage::LeaveRoom { room_id } => {
                let Some((client_id, handle)) = conn.joined.remove(&room_id) else {
                    debug!(room = %room_id, "leave-room for a room this connection never joined, dropping");
                    return;
                };
                let _ = handle.disconnect(client_id).await;
            }

            SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::IceCandidate { .. } => self.relay(msg).await,

            SignalMessage::ExistingUser { .. }
            | SignalMessage::UserJoined { .. }
            | SignalMessage::UserLeft { .. } => {
                debug!("ignoring server-originated frame type from client");
            }
        }
    }

    async fn handle_join(
        &self,
        room_id: RoomId,
        client_id: Option<ClientId>,
        client_name: Option<String>,
        conn: &mut Connection,
    ) {
        let client_id = client_id.unwrap_or_else(ClientId::generate);
        let client_name = client_name.unwrap_or_default();

        // Re-joining the same room under a new id abandons the old one.
        // Without the Disconnect the stale entry would keep the room
        // occupied forever once this connection dies.
        if let Some((old_id, old_handle)) = conn.joined.get(&room_id) {
            if *old_id != client_id {
                let _ = old_handle.disconnect(old_id.clone()).await;
            }
        }

        // get_or_create can hand back a room whose idle grace fired before
        // the Join landed; drop the stale entry and retry against a fresh
        // room under the same id.
        for _ in 0..JOIN_RETRIES {
            let handle = self.registry.get_or_create(&room_id);
            if handle
                .join(client_id.clone(), client_name.clone(), conn.delivery.clone())
                .await
                .is_ok()
            {
                conn.joined.insert(room_id.clone(), (client_id, handle));
                return;
            }
            self.registry.remove(&room_id, &handle);
        }
        warn!(room = %room_id, client = %client_id, "join kept racing room reclamation, giving up");
    }

    /// Forward a relay frame to its room. Unknown rooms and reclaimed
    /// rooms drop the frame without notifying the sender (documented
    /// policy). The whole envelope passes through, not just the payload,
    /// so the receiver sees the sender's clientId.
    async fn relay(&self, msg: SignalMessage) {
        let room_id = msg.room_id();
        let Some(handle) = self.registry.lookup(room_id) else {
            debug!(room = %room_id, "relay frame for unknown room, dropping");
            return;
        };

        let frame = match serde_json::to_string(&msg) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("failed to re-serialize relay frame: {e}");
                return;
            }
        };

        match msg.target_id() {
            Some(target) => {
                let _ = handle.unicast(target.clone(), frame).await;
            }
            None => {
                let _ = handle.broadcast(frame).await;
            }
        }
    }
}
