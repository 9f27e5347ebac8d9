use crate::error::SessionError;
use crate::media::{MediaCapture, MediaConstraints};
use crate::membership::MembershipStore;
use crate::mesh::{MeshCommand, MeshConfig, MeshCoordinator, PeerSnapshot};
use crate::signaling::SignalingChannel;
use crate::transport::{RtcTransportFactory, TransportConfig};
use huddle_core::{PeerId, RoomKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Relay base endpoint, e.g. `ws://127.0.0.1:6969`.
    pub endpoint: String,
    pub ice_servers: Vec<String>,
    pub constraints: MediaConstraints,
    pub mesh: MeshConfig,
}

impl SessionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ice_servers: TransportConfig::default().ice_servers,
            constraints: MediaConstraints::default(),
            mesh: MeshConfig::default(),
        }
    }
}

/// Top-level lifecycle object for one participant in one room. Owns the
/// mesh coordinator and the signaling channel together; dropping or leaving
/// releases everything.
pub struct RoomSession {
    local_id: PeerId,
    room: RoomKey,
    cmd_tx: mpsc::Sender<MeshCommand>,
    membership: Arc<dyn MembershipStore>,
    left: AtomicBool,
}

impl RoomSession {
    /// Join a room: generate a fresh identity, open the signaling channel,
    /// start media acquisition concurrently and announce the join once the
    /// channel is open. Membership bookkeeping is best-effort.
    pub async fn join(
        config: SessionConfig,
        room: RoomKey,
        membership: Arc<dyn MembershipStore>,
        capture: Arc<dyn MediaCapture>,
    ) -> Result<Self, SessionError> {
        let local_id = PeerId::new();
        info!(peer = %local_id, room = %room, "joining room");

        let (channel, mut inbound) = SignalingChannel::connect(&config.endpoint, &room).await?;
        let signaling = Arc::new(channel);

        let transports = Arc::new(RtcTransportFactory::new(TransportConfig {
            ice_servers: config.ice_servers.clone(),
        }));

        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let coordinator = MeshCoordinator::new(
            local_id.clone(),
            room.clone(),
            config.mesh.clone(),
            signaling,
            transports,
            capture.clone(),
            cmd_rx,
        );
        tokio::spawn(coordinator.run());

        // Inbound signaling re-enters the coordinator through its command
        // queue, preserving one-event-at-a-time processing.
        let signal_tx = cmd_tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = inbound.recv().await {
                if signal_tx.send(MeshCommand::Signal(msg)).await.is_err() {
                    break;
                }
            }
        });

        // Media acquisition runs concurrently with signaling; its outcome
        // resumes in the coordinator loop. A session whose capture fails
        // simply stays receive-only.
        let media_tx = cmd_tx.clone();
        let constraints = config.constraints;
        tokio::spawn(async move {
            let cmd = match capture.acquire(constraints).await {
                Ok(handle) => MeshCommand::MediaReady(handle),
                Err(e) => MeshCommand::MediaFailed(e),
            };
            let _ = media_tx.send(cmd).await;
        });

        if cmd_tx.send(MeshCommand::SelfJoined).await.is_err() {
            return Err(SessionError::Transport(
                "mesh coordinator stopped before join".to_owned(),
            ));
        }

        if let Err(e) = membership.increment_count(&room).await {
            warn!(room = %room, "membership increment failed: {e}");
        }
        if let Err(e) = membership.set_active(&room, true).await {
            warn!(room = %room, "membership flag update failed: {e}");
        }

        Ok(Self {
            local_id,
            room,
            cmd_tx,
            membership,
            left: AtomicBool::new(false),
        })
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn room(&self) -> &RoomKey {
        &self.room
    }

    /// Current peer links and their negotiation states. Empty once the
    /// session has left.
    pub async fn peers(&self) -> Vec<PeerSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.cmd_tx.send(MeshCommand::Query(reply_tx)).await.is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Tear down the mesh, release media, close the channel and give back
    /// the room's occupancy slot. Idempotent; safe while negotiation or
    /// media acquisition is still pending.
    pub async fn leave(&self) {
        if self.left.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(peer = %self.local_id, room = %self.room, "leaving room");

        let (done_tx, done_rx) = oneshot::channel();
        if self.cmd_tx.send(MeshCommand::Teardown(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }

        if let Err(e) = self.membership.decrement_count(&self.room).await {
            warn!(room = %self.room, "membership decrement failed: {e}");
        }
        if let Err(e) = self.membership.set_active(&self.room, false).await {
            warn!(room = %self.room, "membership flag update failed: {e}");
        }
    }
}
