use crate::error::SessionError;
use crate::transport::{LinkEvent, PeerTransport, PeerTransportFactory};
use async_trait::async_trait;
use huddle_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
        }
    }
}

/// Production [`PeerTransportFactory`] backed by the `webrtc` crate.
pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PeerTransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerTransport>, SessionError> {
        let transport = RtcPeerTransport::new(peer_id, self.config.clone(), events).await?;
        Ok(Box::new(transport))
    }
}

struct RtcPeerTransport {
    peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcPeerTransport {
    /// Build the RTCPeerConnection and wire its callbacks into the
    /// coordinator's event channel.
    async fn new(
        peer_id: PeerId,
        config: TransportConfig,
        event_tx: mpsc::Sender<LinkEvent>,
    ) -> Result<Self, SessionError> {
        let map_err = |e: webrtc::Error| SessionError::negotiation(&peer_id, e);

        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(map_err)?;
        let registry =
            register_default_interceptors(Registry::new(), &mut media_engine).map_err(map_err)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(map_err)?,
        );

        // Always negotiate audio and video sections: a participant whose
        // capture failed still receives remote media.
        for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
            peer_connection
                .add_transceiver_from_kind(kind, None)
                .await
                .map_err(map_err)?;
        }

        // Connection health: failed/disconnected/closed all fold into one
        // Disconnected event; the coordinator treats it as a peer leave.
        let state_tx = event_tx.clone();
        let state_peer = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let peer = state_peer.clone();

                Box::pin(async move {
                    info!(%peer, state = ?s, "peer connection state changed");
                    match s {
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(LinkEvent::Disconnected { peer_id: peer }).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        // Trickle ICE: locally gathered candidates go out via the relay.
        let ice_tx = event_tx.clone();
        let ice_peer = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let peer = ice_peer.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(json) = serde_json::to_string(&init) else {
                    return;
                };
                let _ = tx
                    .send(LinkEvent::CandidateGenerated {
                        peer_id: peer,
                        candidate: json,
                    })
                    .await;
            })
        }));

        let track_tx = event_tx.clone();
        let track_peer = peer_id.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let peer = track_peer.clone();

                Box::pin(async move {
                    debug!(%peer, track = %track.id(), "remote track received");
                    let _ = tx
                        .send(LinkEvent::RemoteTrack {
                            peer_id: peer,
                            track_id: track.id(),
                        })
                        .await;
                })
            },
        ));

        Ok(Self {
            peer_id,
            peer_connection,
        })
    }

    fn negotiation_err(&self, e: impl std::fmt::Display) -> SessionError {
        SessionError::negotiation(&self.peer_id, e)
    }
}

#[async_trait]
impl PeerTransport for RtcPeerTransport {
    async fn create_offer(&self) -> Result<String, SessionError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| self.negotiation_err(e))?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(|e| self.negotiation_err(e))?;
        Ok(offer.sdp)
    }

    async fn apply_remote_offer(&self, sdp: String) -> Result<String, SessionError> {
        let desc = RTCSessionDescription::offer(sdp).map_err(|e| self.negotiation_err(e))?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| self.negotiation_err(e))?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| self.negotiation_err(e))?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(|e| self.negotiation_err(e))?;
        Ok(answer.sdp)
    }

    async fn apply_remote_answer(&self, sdp: String) -> Result<(), SessionError> {
        let desc = RTCSessionDescription::answer(sdp).map_err(|e| self.negotiation_err(e))?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| self.negotiation_err(e))?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), SessionError> {
        // Candidates normally arrive as the JSON form of RTCIceCandidateInit,
        // but some senders ship the bare candidate line.
        let init = if candidate.trim_start().starts_with('{') {
            serde_json::from_str::<RTCIceCandidateInit>(&candidate)
                .map_err(|e| self.negotiation_err(e))?
        } else {
            RTCIceCandidateInit {
                candidate,
                ..Default::default()
            }
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| self.negotiation_err(e))?;
        Ok(())
    }

    async fn attach_track(
        &self,
        track: Arc<dyn TrackLocal + Send + Sync>,
    ) -> Result<(), SessionError> {
        self.peer_connection
            .add_track(track)
            .await
            .map_err(|e| self.negotiation_err(e))?;
        Ok(())
    }

    async fn close(&self) {
        let _ = self.peer_connection.close().await;
    }
}
