pub mod error;
pub mod media;
pub mod membership;
pub mod mesh;
pub mod session;
pub mod signaling;
pub mod transport;

pub use error::SessionError;
pub use media::{MediaCapture, MediaConstraints, MediaHandle, NullCapture, StaticCapture};
pub use membership::{LocalMembership, MembershipStore};
pub use mesh::{MeshCommand, MeshConfig, MeshCoordinator, NegotiationState, PeerSnapshot};
pub use session::{RoomSession, SessionConfig};
pub use signaling::{SignalingChannel, SignalingOutput};
pub use transport::{
    LinkEvent, PeerTransport, PeerTransportFactory, RtcTransportFactory, TransportConfig,
};
