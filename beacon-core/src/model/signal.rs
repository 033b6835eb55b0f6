use crate::model::ids::{ClientId, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One signaling frame, exchanged as a single JSON object per WebSocket
/// text message and discriminated by its `type` field.
///
/// `data` carries the negotiation payload (SDP blob, ICE candidate) and is
/// relayed verbatim; the server never inspects it. Absent optional fields
/// are omitted from the serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SignalMessage {
    /// Client asks to join a room. Without a `clientId` the server assigns one.
    JoinRoom {
        room_id: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_name: Option<String>,
    },
    /// Client leaves a room it previously joined on this connection.
    LeaveRoom { room_id: RoomId },
    /// Session offer, relayed to `targetId` or broadcast when absent.
    Offer {
        room_id: RoomId,
        data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<ClientId>,
    },
    /// Session answer, relayed like an offer.
    Answer {
        room_id: RoomId,
        data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<ClientId>,
    },
    /// Connectivity candidate, relayed like an offer.
    IceCandidate {
        room_id: RoomId,
        data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<ClientId>,
    },
    /// Server -> joining client: one frame per member already in the room.
    ExistingUser {
        room_id: RoomId,
        client_id: ClientId,
        client_name: String,
    },
    /// Server -> remaining members: a new member was admitted.
    UserJoined {
        room_id: RoomId,
        client_id: ClientId,
        client_name: String,
    },
    /// Server -> remaining members: a member left or its connection died.
    UserLeft { room_id: RoomId, client_id: ClientId },
}

impl SignalMessage {
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::LeaveRoom { room_id }
            | Self::Offer { room_id, .. }
            | Self::Answer { room_id, .. }
            | Self::IceCandidate { room_id, .. }
            | Self::ExistingUser { room_id, .. }
            | Self::UserJoined { room_id, .. }
            | Self::UserLeft { room_id, .. } => room_id,
        }
    }

    /// Unicast target of a relay frame, if one was named.
    pub fn target_id(&self) -> Option<&ClientId> {
        match self {
            Self::Offer { target_id, .. }
            | Self::Answer { target_id, .. }
            | Self::IceCandidate { target_id, .. } => target_id.as_ref(),
            _ => None,
        }
    }
}
