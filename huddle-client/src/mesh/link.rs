use crate::error::SessionError;
use crate::media::MediaHandle;
use crate::transport::PeerTransport;
use huddle_core::PeerId;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Negotiation state of one peer link. `Closed` is terminal; a closed link
/// accepts no further messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferPending,
    AnswerPending,
    Negotiated,
    Closed,
}

/// The per-peer connection record: transport handle, negotiation state and
/// the buffer absorbing candidates that arrive before the remote description
/// is in place. Owned exclusively by the mesh coordinator.
pub(crate) struct PeerLink {
    peer_id: PeerId,
    state: NegotiationState,
    transport: Box<dyn PeerTransport>,
    pending_candidates: Vec<String>,
    remote_description_set: bool,
    media_attached: bool,
    opened_at: Instant,
}

impl PeerLink {
    pub fn new(peer_id: PeerId, transport: Box<dyn PeerTransport>) -> Self {
        Self {
            peer_id,
            state: NegotiationState::Idle,
            transport,
            pending_candidates: Vec::new(),
            remote_description_set: false,
            media_attached: false,
            opened_at: Instant::now(),
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// True while the link sits in a pre-negotiated state older than `age`.
    pub fn stalled_since(&self, age: std::time::Duration) -> bool {
        matches!(
            self.state,
            NegotiationState::OfferPending | NegotiationState::AnswerPending
        ) && self.opened_at.elapsed() >= age
    }

    /// Initiator path: create and install the local offer. `Idle → OfferPending`.
    pub async fn start_offer(&mut self) -> Result<String, SessionError> {
        debug_assert_eq!(self.state, NegotiationState::Idle);
        let sdp = self.transport.create_offer().await?;
        self.state = NegotiationState::OfferPending;
        Ok(sdp)
    }

    /// Responder path: apply the remote offer and produce the answer.
    /// `Idle → AnswerPending → Negotiated`, draining buffered candidates
    /// before the transition completes.
    pub async fn accept_offer(&mut self, sdp: String) -> Result<String, SessionError> {
        if self.state != NegotiationState::Idle {
            debug!(peer = %self.peer_id, state = ?self.state, "offer ignored");
            return Err(SessionError::negotiation(
                &self.peer_id,
                format!("offer received in state {:?}", self.state),
            ));
        }
        self.state = NegotiationState::AnswerPending;
        let answer = self.transport.apply_remote_offer(sdp).await?;
        self.remote_description_set = true;
        self.drain_candidates().await;
        self.state = NegotiationState::Negotiated;
        Ok(answer)
    }

    /// Initiator path: apply the remote answer.
    /// `OfferPending → AnswerPending → Negotiated`; any other state is a
    /// duplicate or stale answer and is ignored.
    pub async fn accept_answer(&mut self, sdp: String) -> Result<(), SessionError> {
        if self.state != NegotiationState::OfferPending {
            debug!(peer = %self.peer_id, state = ?self.state, "answer ignored");
            return Ok(());
        }
        self.state = NegotiationState::AnswerPending;
        self.transport.apply_remote_answer(sdp).await?;
        self.remote_description_set = true;
        self.drain_candidates().await;
        self.state = NegotiationState::Negotiated;
        Ok(())
    }

    /// Apply a remote candidate, or buffer it while the remote description
    /// is not yet accepted. Buffered candidates keep arrival order.
    pub async fn handle_candidate(&mut self, candidate: String) {
        if self.state == NegotiationState::Closed {
            debug!(peer = %self.peer_id, "candidate for closed link dropped");
            return;
        }
        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            return;
        }
        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            warn!(peer = %self.peer_id, "failed to add ice candidate: {e}");
        }
    }

    /// Apply everything buffered, in arrival order. Taking the buffer makes
    /// the drain idempotent: a second call sees it empty.
    async fn drain_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!(peer = %self.peer_id, "failed to add buffered candidate: {e}");
            }
        }
    }

    /// Attach the shared local media tracks, at most once per link. Links
    /// created before acquisition completes get their tracks here later,
    /// without renegotiation.
    pub async fn attach_media(&mut self, media: &MediaHandle) {
        if self.media_attached || self.state == NegotiationState::Closed {
            return;
        }
        for track in media.tracks() {
            if let Err(e) = self.transport.attach_track(track.clone()).await {
                warn!(peer = %self.peer_id, "failed to attach local track: {e}");
            }
        }
        self.media_attached = true;
    }

    /// Transition to the terminal state and close the transport. Safe to
    /// call from any state, repeatedly.
    pub async fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.state = NegotiationState::Closed;
        self.pending_candidates.clear();
        self.transport.close().await;
    }
}
