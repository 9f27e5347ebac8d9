use async_trait::async_trait;
use huddle_core::SignalMessage;

/// Outbound half of the signaling channel as seen by the mesh coordinator.
/// Send is fire-and-forget: a closed transport logs and drops, it never
/// fails the caller.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, msg: SignalMessage);

    /// Close the underlying transport. Safe to call repeatedly or on an
    /// already-closed channel.
    async fn close(&self);
}
