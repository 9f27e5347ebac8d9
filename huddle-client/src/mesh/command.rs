use crate::error::SessionError;
use crate::media::MediaHandle;
use crate::mesh::NegotiationState;
use huddle_core::{PeerId, SignalMessage};
use tokio::sync::oneshot;

/// Commands driving the mesh coordinator's event loop. Each command is
/// processed to completion before the next one; no two transitions on the
/// same peer link ever interleave.
#[derive(Debug)]
pub enum MeshCommand {
    /// The signaling channel is open; announce the local identity.
    SelfJoined,

    /// An inbound message from the signaling channel.
    Signal(SignalMessage),

    /// Local capture finished acquiring; attach tracks to existing links
    /// and to every link created from now on.
    MediaReady(MediaHandle),

    /// Local capture failed; continue as a receive-only participant.
    MediaFailed(SessionError),

    /// Snapshot of the current peer links, for UIs and diagnostics.
    Query(oneshot::Sender<Vec<PeerSnapshot>>),

    /// Close every link, release media, close the channel, stop the loop.
    Teardown(oneshot::Sender<()>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerSnapshot {
    pub peer_id: PeerId,
    pub state: NegotiationState,
}
