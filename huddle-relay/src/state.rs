use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{PeerId, RoomKey, SignalMessage};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

struct RelayInner {
    rooms: DashMap<RoomKey, HashSet<PeerId>>,
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

/// Shared registry of connected peers and the rooms they occupy. Rooms are
/// implicit: an entry appears on first register and disappears when its last
/// member unregisters.
#[derive(Clone)]
pub struct RelayState {
    inner: Arc<RelayInner>,
}

impl Default for RelayState {
    fn default() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                rooms: DashMap::new(),
                peers: DashMap::new(),
            }),
        }
    }
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, room: &RoomKey, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        info!(room = %room, peer = %peer_id, "registering peer");
        self.inner.peers.insert(peer_id.clone(), tx);
        self.inner
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(peer_id);
    }

    /// Remove the peer; returns true when it was actually registered. The
    /// room entry goes away with its last member.
    pub fn unregister(&self, room: &RoomKey, peer_id: &PeerId) -> bool {
        let was_present = self.inner.peers.remove(peer_id).is_some();

        let mut empty = false;
        if let Some(mut members) = self.inner.rooms.get_mut(room) {
            members.remove(peer_id);
            empty = members.is_empty();
        }
        if empty {
            info!(room = %room, "room empty, removing");
            self.inner.rooms.remove(room);
        }

        was_present
    }

    pub fn occupancy(&self, room: &RoomKey) -> usize {
        self.inner.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// Forward a targeted message to one member of the room. Unroutable
    /// messages are dropped with a warning, never fatal.
    pub fn forward(&self, room: &RoomKey, to: &PeerId, msg: &SignalMessage) {
        let in_room = self
            .inner
            .rooms
            .get(room)
            .map(|m| m.contains(to))
            .unwrap_or(false);
        if !in_room {
            warn!(room = %room, peer = %to, "unroutable message dropped");
            return;
        }
        self.send_to(to, msg);
    }

    /// Deliver a message to every room member except the originator.
    pub fn broadcast(&self, room: &RoomKey, except: &PeerId, msg: &SignalMessage) {
        let members: Vec<PeerId> = match self.inner.rooms.get(room) {
            Some(m) => m.iter().cloned().collect(),
            None => return,
        };
        for member in members {
            if &member != except {
                self.send_to(&member, msg);
            }
        }
    }

    fn send_to(&self, peer_id: &PeerId, msg: &SignalMessage) {
        let Some(tx) = self.inner.peers.get(peer_id) else {
            warn!(peer = %peer_id, "no session for peer, message dropped");
            return;
        };
        match serde_json::to_string(msg) {
            Ok(json) => {
                if tx.send(Message::Text(json.into())).is_err() {
                    warn!(peer = %peer_id, "peer session gone, message dropped");
                }
            }
            Err(e) => error!("failed to serialize signal message: {e}"),
        }
    }
}
