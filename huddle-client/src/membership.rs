use crate::error::SessionError;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::RoomKey;
use std::sync::Arc;

/// Best-effort persistence of per-room membership flags. The session calls
/// these on join/leave; failures are logged by the caller, never propagated.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn set_active(&self, room: &RoomKey, active: bool) -> Result<(), SessionError>;
    async fn get_active(&self, room: &RoomKey) -> Result<bool, SessionError>;
    async fn increment_count(&self, room: &RoomKey) -> Result<(), SessionError>;
    async fn decrement_count(&self, room: &RoomKey) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
struct RoomFlags {
    active: bool,
    count: u32,
}

/// In-memory membership store. Good enough for a single process; a real
/// deployment can swap in a persistent implementation of the trait.
#[derive(Clone, Default)]
pub struct LocalMembership {
    rooms: Arc<DashMap<RoomKey, RoomFlags>>,
}

impl LocalMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupancy(&self, room: &RoomKey) -> u32 {
        self.rooms.get(room).map(|f| f.count).unwrap_or(0)
    }
}

#[async_trait]
impl MembershipStore for LocalMembership {
    async fn set_active(&self, room: &RoomKey, active: bool) -> Result<(), SessionError> {
        self.rooms.entry(room.clone()).or_default().active = active;
        Ok(())
    }

    async fn get_active(&self, room: &RoomKey) -> Result<bool, SessionError> {
        Ok(self.rooms.get(room).map(|f| f.active).unwrap_or(false))
    }

    async fn increment_count(&self, room: &RoomKey) -> Result<(), SessionError> {
        self.rooms.entry(room.clone()).or_default().count += 1;
        Ok(())
    }

    async fn decrement_count(&self, room: &RoomKey) -> Result<(), SessionError> {
        if let Some(mut flags) = self.rooms.get_mut(room) {
            flags.count = flags.count.saturating_sub(1);
        }
        Ok(())
    }
}
