use async_trait::async_trait;
use huddle_client::{MediaCapture, MediaConstraints, MediaHandle, SessionError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// In-memory RTP tracks; no device needed.
pub fn test_tracks(count: usize) -> Vec<Arc<dyn TrackLocal + Send + Sync>> {
    (0..count)
        .map(|i| {
            Arc::new(TrackLocalStaticRTP::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    ..Default::default()
                },
                format!("track-{i}"),
                "huddle-test".to_owned(),
            )) as Arc<dyn TrackLocal + Send + Sync>
        })
        .collect()
}

pub fn test_media(count: usize) -> MediaHandle {
    MediaHandle::new(test_tracks(count))
}

/// Capture whose acquisition never completes, for teardown-while-pending
/// tests. Release is still observable.
#[derive(Default)]
pub struct PendingCapture {
    released: AtomicBool,
}

impl PendingCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaCapture for PendingCapture {
    async fn acquire(&self, _constraints: MediaConstraints) -> Result<MediaHandle, SessionError> {
        std::future::pending().await
    }

    async fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
