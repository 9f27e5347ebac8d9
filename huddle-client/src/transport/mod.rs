mod rtc;
mod transport_event;

pub use rtc::{RtcTransportFactory, TransportConfig};
pub use transport_event::LinkEvent;

use crate::error::SessionError;
use async_trait::async_trait;
use huddle_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;

/// One bidirectional transport session to exactly one remote participant.
/// The mesh coordinator drives it through the negotiation state machine;
/// the transport reports back through the [`LinkEvent`] channel it was
/// created with.
#[async_trait]
pub trait PeerTransport: Send {
    /// Create the local offer and install it as the local description.
    async fn create_offer(&self) -> Result<String, SessionError>;

    /// Responder path: apply the remote offer, create the answer, install it
    /// locally and return its SDP.
    async fn apply_remote_offer(&self, sdp: String) -> Result<String, SessionError>;

    /// Initiator path: apply the remote answer.
    async fn apply_remote_answer(&self, sdp: String) -> Result<(), SessionError>;

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), SessionError>;

    async fn attach_track(
        &self,
        track: Arc<dyn TrackLocal + Send + Sync>,
    ) -> Result<(), SessionError>;

    async fn close(&self);
}

/// Creates transports for new peer links. A seam so the coordinator can be
/// exercised without real network I/O.
#[async_trait]
pub trait PeerTransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerTransport>, SessionError>;
}
