use async_trait::async_trait;
use huddle_client::SignalingOutput;
use huddle_core::{PeerId, SignalMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock SignalingOutput that captures every outgoing signal for inspection.
#[derive(Clone, Default)]
pub struct MockSignaling {
    sent: Arc<Mutex<Vec<SignalMessage>>>,
    closed: Arc<AtomicBool>,
}

impl MockSignaling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SignalMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn offers_to(&self, peer: &PeerId) -> usize {
        self.sent()
            .iter()
            .filter(|m| matches!(m, SignalMessage::Offer { to, .. } if to == peer))
            .count()
    }

    pub fn answers_to(&self, peer: &PeerId) -> usize {
        self.sent()
            .iter()
            .filter(|m| matches!(m, SignalMessage::Answer { to, .. } if to == peer))
            .count()
    }

    pub fn candidates_to(&self, peer: &PeerId) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|m| match m {
                SignalMessage::IceCandidate { to, candidate, .. } if to == peer => {
                    Some(candidate.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn joined(&self) -> bool {
        self.sent()
            .iter()
            .any(|m| matches!(m, SignalMessage::Join { .. }))
    }

    pub fn left(&self) -> bool {
        self.sent()
            .iter()
            .any(|m| matches!(m, SignalMessage::Leave { .. }))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalingOutput for MockSignaling {
    async fn send(&self, msg: SignalMessage) {
        tracing::debug!("[MockSignaling] send {msg:?}");
        self.sent.lock().unwrap().push(msg);
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
