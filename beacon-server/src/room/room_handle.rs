use crate::error::RoomGone;
use crate::room::{DeliveryHandle, RoomCommand};
use beacon_core::{ClientId, RoomSummary};
use tokio::sync::{mpsc, oneshot};

/// Clone-able handle to one room's command queue.
///
/// Every interaction with a room goes through here; the membership map
/// itself is never reachable from outside the room's own task. All
/// operations fail with [`RoomGone`] once the room has been reclaimed.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn new(tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { tx }
    }

    /// Resolves once the room has processed the join. A room whose idle
    /// grace fires with the command still buffered drops it, which
    /// surfaces here as [`RoomGone`] rather than a join that silently
    /// never happened.
    pub async fn join(
        &self,
        client_id: ClientId,
        client_name: String,
        delivery: DeliveryHandle,
    ) -> Result<(), RoomGone> {
        let (ack, acked) = oneshot::channel();
        self.send(RoomCommand::Join {
            client_id,
            client_name,
            delivery,
            ack,
        })
        .await?;
        acked.await.map_err(|_| RoomGone)
    }

    pub async fn unicast(&self, target_id: ClientId, frame: String) -> Result<(), RoomGone> {
        self.send(RoomCommand::Unicast { target_id, frame }).await
    }

    pub async fn broadcast(&self, frame: String) -> Result<(), RoomGone> {
        self.send(RoomCommand::Broadcast { frame }).await
    }

    pub async fn disconnect(&self, client_id: ClientId) -> Result<(), RoomGone> {
        self.send(RoomCommand::Disconnect { client_id }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSummary, RoomGone> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| RoomGone)
    }

    /// Whether this handle and `other` point at the same command queue.
    /// Used by the registry to make removal identity-checked.
    pub(crate) fn same_channel(&self, other: &mpsc::Sender<RoomCommand>) -> bool {
        self.tx.same_channel(other)
    }

    pub(crate) fn same_room(&self, other: &RoomHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomGone> {
        self.tx.send(cmd).await.map_err(|_| RoomGone)
    }
}
