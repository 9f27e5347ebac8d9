use huddle_core::PeerId;

/// Events a peer transport pushes back into the coordinator's event loop.
/// Resumption always re-enters the loop through this channel; transports
/// never mutate coordinator state directly.
#[derive(Debug)]
pub enum LinkEvent {
    /// Trickle ICE: a local candidate to forward to the remote peer.
    CandidateGenerated { peer_id: PeerId, candidate: String },

    /// A remote media track started arriving.
    RemoteTrack { peer_id: PeerId, track_id: String },

    /// The underlying connection failed, disconnected or closed.
    Disconnected { peer_id: PeerId },
}
