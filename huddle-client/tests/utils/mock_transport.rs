use async_trait::async_trait;
use huddle_client::{LinkEvent, PeerTransport, PeerTransportFactory, SessionError};
use huddle_core::PeerId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;

/// Everything a mock transport was asked to do, in call order where the
/// order matters.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub offers_created: usize,
    pub offers_applied: Vec<String>,
    pub answers_applied: Vec<String>,
    pub candidates: Vec<String>,
    pub tracks: usize,
    pub closed: bool,
}

/// Factory handing out recording transports and keeping their logs and
/// event senders so tests can inspect links and inject transport events.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    logs: Arc<Mutex<HashMap<PeerId, Arc<Mutex<TransportLog>>>>>,
    events: Arc<Mutex<HashMap<PeerId, mpsc::Sender<LinkEvent>>>>,
    fail_descriptions: Arc<AtomicBool>,
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent description application fail, for exercising
    /// the NegotiationError path.
    pub fn fail_descriptions(&self) {
        self.fail_descriptions.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.logs.lock().unwrap().len()
    }

    pub fn log_for(&self, peer: &PeerId) -> Option<Arc<Mutex<TransportLog>>> {
        self.logs.lock().unwrap().get(peer).cloned()
    }

    /// Inject a transport event for a created link, as the real transport's
    /// callbacks would.
    pub async fn emit(&self, peer: &PeerId, event: LinkEvent) {
        let tx = self
            .events
            .lock()
            .unwrap()
            .get(peer)
            .cloned()
            .expect("no transport created for peer");
        tx.send(event).await.expect("coordinator loop gone");
    }
}

#[async_trait]
impl PeerTransportFactory for MockTransportFactory {
    async fn create(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerTransport>, SessionError> {
        let log = Arc::new(Mutex::new(TransportLog::default()));
        self.logs.lock().unwrap().insert(peer_id.clone(), log.clone());
        self.events.lock().unwrap().insert(peer_id.clone(), events);

        Ok(Box::new(MockPeerTransport {
            peer_id,
            log,
            fail_descriptions: self.fail_descriptions.clone(),
        }))
    }
}

pub struct MockPeerTransport {
    peer_id: PeerId,
    log: Arc<Mutex<TransportLog>>,
    fail_descriptions: Arc<AtomicBool>,
}

impl MockPeerTransport {
    fn description_error(&self) -> SessionError {
        SessionError::Negotiation {
            peer: self.peer_id.clone(),
            reason: "description rejected by mock".to_owned(),
        }
    }
}

#[async_trait]
impl PeerTransport for MockPeerTransport {
    async fn create_offer(&self) -> Result<String, SessionError> {
        let mut log = self.log.lock().unwrap();
        log.offers_created += 1;
        Ok(format!("offer-sdp-{}", log.offers_created))
    }

    async fn apply_remote_offer(&self, sdp: String) -> Result<String, SessionError> {
        if self.fail_descriptions.load(Ordering::SeqCst) {
            return Err(self.description_error());
        }
        self.log.lock().unwrap().offers_applied.push(sdp);
        Ok("answer-sdp".to_owned())
    }

    async fn apply_remote_answer(&self, sdp: String) -> Result<(), SessionError> {
        if self.fail_descriptions.load(Ordering::SeqCst) {
            return Err(self.description_error());
        }
        self.log.lock().unwrap().answers_applied.push(sdp);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), SessionError> {
        self.log.lock().unwrap().candidates.push(candidate);
        Ok(())
    }

    async fn attach_track(
        &self,
        _track: Arc<dyn TrackLocal + Send + Sync>,
    ) -> Result<(), SessionError> {
        self.log.lock().unwrap().tracks += 1;
        Ok(())
    }

    async fn close(&self) {
        self.log.lock().unwrap().closed = true;
    }
}
