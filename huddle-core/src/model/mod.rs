mod peer;
mod room;
mod signaling;

pub use peer::PeerId;
pub use room::RoomKey;
pub use signaling::SignalMessage;
