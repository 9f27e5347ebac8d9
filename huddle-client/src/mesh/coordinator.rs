use crate::media::{MediaCapture, MediaHandle};
use crate::mesh::command::{MeshCommand, PeerSnapshot};
use crate::mesh::link::PeerLink;
use crate::signaling::SignalingOutput;
use crate::transport::{LinkEvent, PeerTransportFactory};
use huddle_core::{PeerId, RoomKey, SignalMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// A link stalled in `OfferPending`/`AnswerPending` past this bound is
    /// treated as if the peer left. `None` disables the sweep.
    pub negotiation_timeout: Option<Duration>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout: Some(Duration::from_secs(30)),
        }
    }
}

const STALL_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Single authoritative owner of the peer link set for the local session.
///
/// Runs as one event loop task: every state transition happens in response
/// to a discrete event and is processed to completion before the next, so
/// no two transitions on the same link can interleave. The core invariant
/// it enforces is at most one link per remote identity, regardless of how
/// discovery messages arrive or repeat.
pub struct MeshCoordinator {
    local_id: PeerId,
    room: RoomKey,
    config: MeshConfig,
    links: HashMap<PeerId, PeerLink>,
    signaling: Arc<dyn SignalingOutput>,
    transports: Arc<dyn PeerTransportFactory>,
    capture: Arc<dyn MediaCapture>,
    media: Option<MediaHandle>,
    command_rx: mpsc::Receiver<MeshCommand>,
    link_rx: mpsc::Receiver<LinkEvent>,
    link_tx: mpsc::Sender<LinkEvent>,
}

impl MeshCoordinator {
    pub fn new(
        local_id: PeerId,
        room: RoomKey,
        config: MeshConfig,
        signaling: Arc<dyn SignalingOutput>,
        transports: Arc<dyn PeerTransportFactory>,
        capture: Arc<dyn MediaCapture>,
        command_rx: mpsc::Receiver<MeshCommand>,
    ) -> Self {
        let (link_tx, link_rx) = mpsc::channel(256);

        Self {
            local_id,
            room,
            config,
            links: HashMap::new(),
            signaling,
            transports,
            capture,
            media: None,
            command_rx,
            link_rx,
            link_tx,
        }
    }

    pub async fn run(mut self) {
        info!(peer = %self.local_id, room = %self.room, "mesh coordinator started");

        let mut sweep = tokio::time::interval(STALL_SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(MeshCommand::Teardown(done)) => {
                            self.teardown().await;
                            let _ = done.send(());
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            // Session dropped without an explicit leave;
                            // converge to released resources anyway.
                            self.teardown().await;
                            break;
                        }
                    }
                }

                evt = self.link_rx.recv() => {
                    if let Some(evt) = evt {
                        self.handle_link_event(evt).await;
                    }
                }

                _ = sweep.tick() => self.expire_stalled_links().await,
            }
        }

        info!(peer = %self.local_id, "mesh coordinator finished");
    }

    async fn handle_command(&mut self, cmd: MeshCommand) {
        match cmd {
            MeshCommand::SelfJoined => self.on_self_joined().await,
            MeshCommand::Signal(msg) => self.on_signaling_message(msg).await,
            MeshCommand::MediaReady(handle) => self.on_media_ready(handle).await,
            MeshCommand::MediaFailed(e) => {
                warn!("continuing without local media: {e}");
            }
            MeshCommand::Query(reply) => {
                let _ = reply.send(self.snapshot());
            }
            // Teardown is intercepted by the run loop so it can stop itself;
            // reaching here means the loop already broke.
            MeshCommand::Teardown(done) => {
                let _ = done.send(());
            }
        }
    }

    async fn on_self_joined(&mut self) {
        self.signaling
            .send(SignalMessage::Join {
                room: self.room.clone(),
                peer_id: self.local_id.clone(),
            })
            .await;
    }

    async fn on_signaling_message(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::NewUser { peer_id } => self.on_peer_announced(peer_id).await,
            SignalMessage::Leave { peer_id } => self.on_peer_left(peer_id).await,
            SignalMessage::Offer { peer_id, sdp, .. } => self.handle_offer(peer_id, sdp).await,
            SignalMessage::Answer { peer_id, sdp, .. } => self.handle_answer(peer_id, sdp).await,
            SignalMessage::IceCandidate {
                peer_id, candidate, ..
            } => self.handle_candidate(peer_id, candidate).await,
            SignalMessage::Join { peer_id, .. } => {
                // The relay translates joins into new-user fan-out; a raw
                // join reaching a client is harmless noise.
                debug!(peer = %peer_id, "raw join message ignored");
            }
        }
    }

    /// Tie-break rule for near-simultaneous discovery: a peer already held
    /// in the link set (or the local identity itself) is ignored, so exactly
    /// one offer is ever sent per remote peer.
    async fn on_peer_announced(&mut self, remote: PeerId) {
        if remote == self.local_id {
            debug!("ignoring self announcement");
            return;
        }
        if self.links.contains_key(&remote) {
            debug!(peer = %remote, "already connected, announcement ignored");
            return;
        }

        let transport = match self
            .transports
            .create(remote.clone(), self.link_tx.clone())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!(peer = %remote, "failed to create transport: {e}");
                return;
            }
        };

        let mut link = PeerLink::new(remote.clone(), transport);
        if let Some(media) = &self.media {
            link.attach_media(media).await;
        }

        match link.start_offer().await {
            Ok(sdp) => {
                info!(peer = %remote, "sending offer");
                self.signaling
                    .send(SignalMessage::Offer {
                        to: remote.clone(),
                        peer_id: self.local_id.clone(),
                        sdp,
                    })
                    .await;
                self.links.insert(remote, link);
            }
            Err(e) => {
                warn!(peer = %remote, "failed to create offer: {e}");
                link.close().await;
            }
        }
    }

    /// Responder path: first offer from an unknown peer creates the link;
    /// an offer for an existing link is the crossed-discovery race and is
    /// dropped.
    async fn handle_offer(&mut self, from: PeerId, sdp: String) {
        if from == self.local_id {
            return;
        }
        if self.links.contains_key(&from) {
            debug!(peer = %from, "offer for existing link ignored");
            return;
        }

        let transport = match self
            .transports
            .create(from.clone(), self.link_tx.clone())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!(peer = %from, "failed to create transport: {e}");
                return;
            }
        };

        let mut link = PeerLink::new(from.clone(), transport);
        if let Some(media) = &self.media {
            link.attach_media(media).await;
        }

        match link.accept_offer(sdp).await {
            Ok(answer) => {
                info!(peer = %from, "sending answer");
                self.signaling
                    .send(SignalMessage::Answer {
                        to: from.clone(),
                        peer_id: self.local_id.clone(),
                        sdp: answer,
                    })
                    .await;
                self.links.insert(from, link);
            }
            Err(e) => {
                warn!(peer = %from, "negotiation failed, dropping link: {e}");
                link.close().await;
            }
        }
    }

    async fn handle_answer(&mut self, from: PeerId, sdp: String) {
        let Some(link) = self.links.get_mut(&from) else {
            warn!(peer = %from, "answer for unknown peer dropped");
            return;
        };

        if let Err(e) = link.accept_answer(sdp).await {
            warn!(peer = %from, "negotiation failed, dropping link: {e}");
            if let Some(mut link) = self.links.remove(&from) {
                link.close().await;
            }
        }
    }

    async fn handle_candidate(&mut self, from: PeerId, candidate: String) {
        let Some(link) = self.links.get_mut(&from) else {
            warn!(peer = %from, "candidate for unknown peer dropped");
            return;
        };
        link.handle_candidate(candidate).await;
    }

    /// Close and discard the matching link. Idempotent: a second call for
    /// the same peer finds nothing and changes nothing.
    async fn on_peer_left(&mut self, remote: PeerId) {
        match self.links.remove(&remote) {
            Some(mut link) => {
                info!(peer = %remote, "peer left, closing link");
                link.close().await;
            }
            None => debug!(peer = %remote, "leave for unknown peer ignored"),
        }
    }

    async fn on_media_ready(&mut self, handle: MediaHandle) {
        info!(tracks = handle.tracks().len(), "local media ready");
        for link in self.links.values_mut() {
            link.attach_media(&handle).await;
        }
        self.media = Some(handle);
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::CandidateGenerated { peer_id, candidate } => {
                // Only forward candidates for live links; a transport may
                // still be gathering while its link is torn down.
                if self.links.contains_key(&peer_id) {
                    self.signaling
                        .send(SignalMessage::IceCandidate {
                            to: peer_id,
                            peer_id: self.local_id.clone(),
                            candidate,
                        })
                        .await;
                }
            }
            LinkEvent::RemoteTrack { peer_id, track_id } => {
                info!(peer = %peer_id, track = %track_id, "remote track available");
            }
            LinkEvent::Disconnected { peer_id } => {
                self.on_peer_left(peer_id).await;
            }
        }
    }

    async fn expire_stalled_links(&mut self) {
        let Some(timeout) = self.config.negotiation_timeout else {
            return;
        };
        let stalled: Vec<PeerId> = self
            .links
            .values()
            .filter(|link| link.stalled_since(timeout))
            .map(|link| link.peer_id().clone())
            .collect();

        for peer in stalled {
            warn!(peer = %peer, "negotiation stalled past {timeout:?}, dropping link");
            self.on_peer_left(peer).await;
        }
    }

    fn snapshot(&self) -> Vec<PeerSnapshot> {
        self.links
            .values()
            .map(|link| PeerSnapshot {
                peer_id: link.peer_id().clone(),
                state: link.state(),
            })
            .collect()
    }

    /// Close every link, release the media source and close the signaling
    /// channel. Safe mid-negotiation and after partial setup; afterwards the
    /// link set is empty and nothing is leaked.
    async fn teardown(&mut self) {
        info!(peer = %self.local_id, links = self.links.len(), "tearing down mesh");

        for (_, mut link) in self.links.drain() {
            link.close().await;
        }
        self.media = None;
        self.capture.release().await;

        self.signaling
            .send(SignalMessage::Leave {
                peer_id: self.local_id.clone(),
            })
            .await;
        self.signaling.close().await;
    }
}
