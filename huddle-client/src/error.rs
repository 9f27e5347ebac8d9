use huddle_core::PeerId;
use thiserror::Error;

/// Failure taxonomy for the session core. Nothing here is globally fatal:
/// the worst outcome of any single failure is the loss of one peer link,
/// never the whole session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The signaling channel could not open or dropped mid-session.
    #[error("signaling transport error: {0}")]
    Transport(String),

    /// Local capture was denied or no device is present. The session
    /// continues as a receive-only participant.
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),

    /// The remote description was rejected. Only the affected peer link is
    /// closed and dropped.
    #[error("negotiation with {peer} failed: {reason}")]
    Negotiation { peer: PeerId, reason: String },

    /// Unroutable or malformed signaling message. Logged and dropped.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl SessionError {
    pub(crate) fn negotiation(peer: &PeerId, err: impl std::fmt::Display) -> Self {
        Self::Negotiation {
            peer: peer.clone(),
            reason: err.to_string(),
        }
    }
}
