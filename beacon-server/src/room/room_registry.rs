use crate::error::RegistryError;
use crate::room::{Room, RoomCommand, RoomHandle};
use crate::store::SessionStore;
use beacon_core::{RoomId, RoomSummary};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Depth of each room's command queue.
const COMMAND_QUEUE_DEPTH: usize = 100;

/// How long a room snapshot lives in the session store.
const ROOM_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Notice from a room whose idle grace elapsed. Carries the room's own
/// command sender so the registry can verify it is removing that exact
/// room and not a fresh one that reused the id.
pub(crate) struct Reclaim {
    pub(crate) room_id: RoomId,
    pub(crate) sender: mpsc::Sender<RoomCommand>,
}

/// Maps room ids to coordinator handles, creating coordinators on demand.
///
/// `DashMap::entry` keeps the check-and-insert a single serialized
/// operation, so two callers racing to create one unknown id both end up
/// with a handle to the same room.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    reclaim_tx: mpsc::UnboundedSender<Reclaim>,
    store: Option<Arc<dyn SessionStore>>,
    idle_grace: Duration,
}

impl RoomRegistry {
    /// Construct the registry and start its reclaim task. Must run inside
    /// a tokio runtime.
    pub fn new(idle_grace: Duration, store: Option<Arc<dyn SessionStore>>) -> Self {
        let rooms: Arc<DashMap<RoomId, RoomHandle>> = Arc::new(DashMap::new());
        let (reclaim_tx, mut reclaim_rx) = mpsc::unbounded_channel::<Reclaim>();

        let reap_rooms = rooms.clone();
        tokio::spawn(async move {
            while let Some(Reclaim { room_id, sender }) = reclaim_rx.recv().await {
                let removed = reap_rooms.remove_if(&room_id, |_, handle| handle.same_channel(&sender));
                if removed.is_some() {
                    info!(room = %room_id, "empty room reclaimed");
                }
            }
        });

        Self {
            rooms,
            reclaim_tx,
            store,
            idle_grace,
        }
    }

    /// Fetch the room's handle, creating the room if the id is unknown.
    pub fn get_or_create(&self, room_id: &RoomId) -> RoomHandle {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| self.spawn_room(room_id.clone()))
            .clone()
    }

    /// Unconditional creation under a generated id, for out-of-band room
    /// provisioning. A generated id that already exists is a creation
    /// failure, never an overwrite.
    pub fn create(&self) -> Result<(RoomId, RoomHandle), RegistryError> {
        let room_id = RoomId::generate();
        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::IdCollision(room_id)),
            Entry::Vacant(slot) => {
                let handle = self.spawn_room(room_id.clone());
                slot.insert(handle.clone());
                Ok((room_id, handle))
            }
        }
    }

    /// Read path; never creates.
    pub fn lookup(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.clone())
    }

    /// Deregister a room, but only if `handle` still names the registered
    /// coordinator. Returns whether an entry was removed.
    pub fn remove(&self, room_id: &RoomId, handle: &RoomHandle) -> bool {
        self.rooms
            .remove_if(room_id, |_, registered| registered.same_room(handle))
            .is_some()
    }

    fn spawn_room(&self, room_id: RoomId) -> RoomHandle {
        info!(room = %room_id, "creating room");
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let room = Room::new(
            room_id.clone(),
            rx,
            tx.downgrade(),
            self.reclaim_tx.clone(),
            self.store.clone(),
            self.idle_grace,
        );
        tokio::spawn(room.run());
        self.mirror_created(room_id);
        RoomHandle::new(tx)
    }

    fn mirror_created(&self, room_id: RoomId) {
        let Some(store) = &self.store else { return };
        let store = store.clone();
        tokio::spawn(async move {
            let summary = RoomSummary {
                id: room_id.clone(),
                client_count: 0,
            };
            if let Err(e) = store.put_room(&summary, ROOM_SNAPSHOT_TTL).await {
                warn!(room = %room_id, "session store put_room failed: {e}");
            }
        });
    }
}
