use crate::model::peer::PeerId;
use crate::model::room::RoomKey;
use serde::{Deserialize, Serialize};

/// Wire protocol spoken over the signaling relay. JSON with a `type`
/// discriminator; field names match what the relay's other clients expect.
///
/// Targeted messages (`offer`/`answer`/`ice-candidate`) carry the sender in
/// `peerId` and the addressee in `to`; the relay routes on `to` and delivers
/// the message unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    Join {
        room: RoomKey,
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
    NewUser {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
    Offer {
        to: PeerId,
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        sdp: String,
    },
    Answer {
        to: PeerId,
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        sdp: String,
    },
    IceCandidate {
        to: PeerId,
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        candidate: String,
    },
    Leave {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
}

impl SignalMessage {
    /// Addressee of a targeted message, if any. `join`/`new-user`/`leave`
    /// are room-scoped and have no single target.
    pub fn target(&self) -> Option<&PeerId> {
        match self {
            SignalMessage::Offer { to, .. }
            | SignalMessage::Answer { to, .. }
            | SignalMessage::IceCandidate { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Originating peer of the message.
    pub fn sender(&self) -> &PeerId {
        match self {
            SignalMessage::Join { peer_id, .. }
            | SignalMessage::NewUser { peer_id }
            | SignalMessage::Offer { peer_id, .. }
            | SignalMessage::Answer { peer_id, .. }
            | SignalMessage::IceCandidate { peer_id, .. }
            | SignalMessage::Leave { peer_id } => peer_id,
        }
    }
}
