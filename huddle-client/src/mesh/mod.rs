mod command;
mod coordinator;
mod link;

pub use command::{MeshCommand, PeerSnapshot};
pub use coordinator::{MeshConfig, MeshCoordinator};
pub use link::NegotiationState;
