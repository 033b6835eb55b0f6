use crate::room::{DeliveryHandle, Reclaim, RoomCommand};
use crate::store::SessionStore;
use beacon_core::{ClientId, RoomId, RoomSummary, SignalMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

struct ClientInfo {
    name: String,
    joined_at: Instant,
    delivery: DeliveryHandle,
}

/// One room: membership plus the serialized command loop that owns it.
///
/// The loop processes exactly one command at a time, which is what makes
/// joins, leaves and relays race-free without any locking around the
/// membership map. Nothing outside [`Room::run`] can reach `members`.
pub struct Room {
    id: RoomId,
    members: HashMap<ClientId, ClientInfo>,
    command_rx: mpsc::Receiver<RoomCommand>,
    self_tx: mpsc::WeakSender<RoomCommand>,
    reclaim_tx: mpsc::UnboundedSender<Reclaim>,
    store: Option<Arc<dyn SessionStore>>,
    idle_grace: Duration,
    created_at: Instant,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        self_tx: mpsc::WeakSender<RoomCommand>,
        reclaim_tx: mpsc::UnboundedSender<Reclaim>,
        store: Option<Arc<dyn SessionStore>>,
        idle_grace: Duration,
    ) -> Self {
        Self {
            id,
            members: HashMap::new(),
            command_rx,
            self_tx,
            reclaim_tx,
            store,
            idle_grace,
            created_at: Instant::now(),
        }
    }

    pub(crate) async fn run(mut self) {
        info!(room = %self.id, "room started");

        // Rooms start empty, so the idle clock is armed from the first
        // iteration; HTTP-created rooms nobody joins expire the same way
        // as rooms whose last member left.
        let grace = self.idle_grace;
        let mut empty_since = Some(Instant::now());

        loop {
            let idle_deadline = async move {
                match empty_since {
                    Some(since) => tokio::time::sleep_until(since + grace).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        info!(room = %self.id, "command channel closed, shutting down");
                        break;
                    }
                },
                _ = idle_deadline => {
                    self.reclaim();
                    break;
                }
            }

            empty_since = match (self.members.is_empty(), empty_since) {
                (true, None) => Some(Instant::now()),
                (true, since) => since,
                (false, _) => None,
            };
        }

        info!(room = %self.id, uptime = ?self.created_at.elapsed(), "room finished");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                client_id,
                client_name,
                delivery,
                ack,
            } => {
                self.handle_join(client_id, client_name, delivery);
                let _ = ack.send(());
            }

            RoomCommand::Unicast { target_id, frame } => {
                let Some(target) = self.members.get(&target_id) else {
                    debug!(room = %self.id, target = %target_id, "unicast target not in room, dropping frame");
                    return;
                };
                if target.delivery.send(frame).is_err() {
                    self.prune(vec![target_id]);
                }
            }

            RoomCommand::Broadcast { frame } => {
                let mut dead = Vec::new();
                for (id, member) in &self.members {
                    if member.delivery.send(frame.clone()).is_err() {
                        dead.push(id.clone());
                    }
                }
                self.prune(dead);
            }

            RoomCommand::Disconnect { client_id } => self.prune(vec![client_id]),

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(RoomSummary {
                    id: self.id.clone(),
                    client_count: self.members.len(),
                });
            }
        }
    }

    fn handle_join(&mut self, client_id: ClientId, client_name: String, delivery: DeliveryHandle) {
        // A reconnect under a live id replaces the old entry; the peers
        // never saw it leave, so no user-left round for the stale one.
        self.members.remove(&client_id);

        // Roster first: one existing-user frame per current member, never
        // one describing the joiner itself.
        let mut joiner_gone = false;
        for (id, member) in &self.members {
            let frame = SignalMessage::ExistingUser {
                room_id: self.id.clone(),
                client_id: id.clone(),
                client_name: member.name.clone(),
            };
            let Some(frame) = encode(&frame) else { continue };
            if delivery.send(frame).is_err() {
                joiner_gone = true;
                break;
            }
        }

        self.members.insert(
            client_id.clone(),
            ClientInfo {
                name: client_name.clone(),
                joined_at: Instant::now(),
                delivery,
            },
        );
        info!(
            room = %self.id,
            client = %client_id,
            name = %client_name,
            members = self.members.len(),
            "client joined"
        );

        let mut dead = Vec::new();
        if joiner_gone {
            dead.push(client_id.clone());
        }

        if let Some(frame) = encode(&SignalMessage::UserJoined {
            room_id: self.id.clone(),
            client_id: client_id.clone(),
            client_name,
        }) {
            for (id, member) in &self.members {
                if *id == client_id {
                    continue;
                }
                if member.delivery.send(frame.clone()).is_err() {
                    dead.push(id.clone());
                }
            }
            self.mirror_join(&client_id, frame);
        }

        self.prune(dead);
    }

    /// Drain a worklist of dead members. Removing one member can reveal
    /// further dead connections while fanning out user-left, so this loops
    /// until every notification either landed or its target was removed.
    fn prune(&mut self, mut dead: Vec<ClientId>) {
        while let Some(id) = dead.pop() {
            dead.extend(self.remove_member(&id));
        }
    }

    /// Remove a member if present, notify the rest, and report which
    /// notifications could not be delivered.
    fn remove_member(&mut self, client_id: &ClientId) -> Vec<ClientId> {
        let Some(info) = self.members.remove(client_id) else {
            return Vec::new();
        };
        info!(
            room = %self.id,
            client = %client_id,
            session = ?info.joined_at.elapsed(),
            members = self.members.len(),
            "client left"
        );
        drop(info);

        let mut failed = Vec::new();
        if let Some(frame) = encode(&SignalMessage::UserLeft {
            room_id: self.id.clone(),
            client_id: client_id.clone(),
        }) {
            for (id, member) in &self.members {
                if member.delivery.send(frame.clone()).is_err() {
                    failed.push(id.clone());
                }
            }
            self.mirror_leave(client_id, frame);
        }
        failed
    }

    /// Best-effort mirror of a join into the session store; never blocks
    /// the command loop and never affects single-instance correctness.
    fn mirror_join(&self, client_id: &ClientId, event: String) {
        let Some(store) = &self.store else { return };
        let store = store.clone();
        let room_id = self.id.clone();
        let client_id = client_id.clone();
        tokio::spawn(async move {
            if let Err(e) = store.add_member(&room_id, &client_id).await {
                warn!(room = %room_id, "session store add_member failed: {e}");
            }
            if let Err(e) = store.publish(&room_id, &event).await {
                warn!(room = %room_id, "session store publish failed: {e}");
            }
        });
    }

    fn mirror_leave(&self, client_id: &ClientId, event: String) {
        let Some(store) = &self.store else { return };
        let store = store.clone();
        let room_id = self.id.clone();
        let client_id = client_id.clone();
        tokio::spawn(async move {
            if let Err(e) = store.remove_member(&room_id, &client_id).await {
                warn!(room = %room_id, "session store remove_member failed: {e}");
            }
            if let Err(e) = store.publish(&room_id, &event).await {
                warn!(room = %room_id, "session store publish failed: {e}");
            }
        });
    }

    fn reclaim(&self) {
        let Some(sender) = self.self_tx.upgrade() else {
            return;
        };
        debug!(room = %self.id, "idle grace elapsed, asking registry to reclaim");
        let _ = self.reclaim_tx.send(Reclaim {
            room_id: self.id.clone(),
            sender,
        });
    }
}

fn encode(msg: &SignalMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("failed to serialize signal frame: {e}");
            None
        }
    }
}
