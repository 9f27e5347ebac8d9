pub mod model;

pub use model::{PeerId, RoomKey, SignalMessage};
