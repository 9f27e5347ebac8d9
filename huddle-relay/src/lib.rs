pub mod state;
pub mod ws_handler;

pub use state::RelayState;
pub use ws_handler::ws_handler;

use axum::Router;
use axum::routing::get;

/// Router for the relay: one WebSocket endpoint per room.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/ws/{room}", get(ws_handler))
        .with_state(state)
}
