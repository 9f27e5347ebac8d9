use crate::error::SessionError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Local capture output, acquired once per session and shared read-only by
/// every peer link created afterwards. Links attach the tracks; they never
/// touch capture settings. Only the room session releases the source.
#[derive(Clone)]
pub struct MediaHandle {
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl MediaHandle {
    pub fn new(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<dyn TrackLocal + Send + Sync>] {
        &self.tracks
    }
}

impl std::fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHandle")
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

/// Seam to the platform capture surface (camera/microphone). `acquire` fails
/// with [`SessionError::MediaUnavailable`] when permission is denied or no
/// device exists; `release` stops every underlying track and is idempotent.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaHandle, SessionError>;
    async fn release(&self);
}

/// Capture source backed by caller-supplied tracks, for pipelines that feed
/// pre-encoded RTP themselves.
pub struct StaticCapture {
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
    released: AtomicBool,
}

impl StaticCapture {
    pub fn new(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self {
            tracks,
            released: AtomicBool::new(false),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaCapture for StaticCapture {
    async fn acquire(&self, _constraints: MediaConstraints) -> Result<MediaHandle, SessionError> {
        if self.is_released() {
            return Err(SessionError::MediaUnavailable(
                "capture source already released".to_owned(),
            ));
        }
        Ok(MediaHandle::new(self.tracks.clone()))
    }

    async fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Capture source for receive-only participants: every acquisition reports
/// media as unavailable and the session continues without local tracks.
#[derive(Debug, Default)]
pub struct NullCapture;

#[async_trait]
impl MediaCapture for NullCapture {
    async fn acquire(&self, _constraints: MediaConstraints) -> Result<MediaHandle, SessionError> {
        Err(SessionError::MediaUnavailable(
            "no capture surface configured".to_owned(),
        ))
    }

    async fn release(&self) {}
}
