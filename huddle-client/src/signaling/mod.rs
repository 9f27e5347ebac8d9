mod channel;
mod output;

pub use channel::SignalingChannel;
pub use output::SignalingOutput;
