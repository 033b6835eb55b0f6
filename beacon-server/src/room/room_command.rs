use beacon_core::{ClientId, RoomSummary};
use tokio::sync::{mpsc, oneshot};

/// Handle sufficient to deliver serialized frames to one client and to
/// detect that the connection behind it is gone (the channel closes when
/// the gateway's writer task drops its receiver). The gateway owns the
/// socket; the room only ever holds this sender.
pub type DeliveryHandle = mpsc::UnboundedSender<String>;

/// Commands processed one at a time by a room's command loop.
#[derive(Debug)]
pub enum RoomCommand {
    /// Admit a client: send it the current roster, insert it, notify the
    /// rest. `ack` resolves once the join has been processed; a room that
    /// shuts down with the command still buffered drops it instead.
    Join {
        client_id: ClientId,
        client_name: String,
        delivery: DeliveryHandle,
        ack: oneshot::Sender<()>,
    },

    /// Deliver a frame to the one member with this id; unknown targets are
    /// dropped without telling the sender.
    Unicast { target_id: ClientId, frame: String },

    /// Deliver a frame to every current member, the originator included.
    Broadcast { frame: String },

    /// Remove a member and tell the remaining ones; no-op for unknown ids.
    Disconnect { client_id: ClientId },

    /// Read-only membership snapshot for the room-info endpoint.
    Snapshot { reply: oneshot::Sender<RoomSummary> },
}
