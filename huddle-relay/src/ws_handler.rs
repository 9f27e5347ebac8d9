use crate::state::RelayState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{PeerId, RoomKey, SignalMessage};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    let room = RoomKey::from(room);
    ws.on_upgrade(move |socket| handle_socket(socket, room, state))
}

async fn handle_socket(socket: WebSocket, room: RoomKey, state: RelayState) {
    info!(room = %room, "new signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Identity is announced in-band by the first `join`; the recv task
    // records it here so cleanup can run after either task ends.
    let registered: Arc<Mutex<Option<PeerId>>> = Arc::new(Mutex::new(None));

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let room = room.clone();
        let registered = registered.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };

                let signal = match serde_json::from_str::<SignalMessage>(text.as_str()) {
                    Ok(signal) => signal,
                    Err(e) => {
                        warn!(room = %room, "malformed signaling message dropped: {e}");
                        continue;
                    }
                };

                if let Some(to) = signal.target().cloned() {
                    // offer / answer / ice-candidate: routed to one member.
                    state.forward(&room, &to, &signal);
                    continue;
                }

                match signal {
                    SignalMessage::Join { peer_id, room: announced } => {
                        if announced != room {
                            warn!(
                                room = %room, announced = %announced,
                                "join names a different room, using the endpoint's"
                            );
                        }
                        state.register(&room, peer_id.clone(), tx.clone());
                        if let Ok(mut slot) = registered.lock() {
                            *slot = Some(peer_id.clone());
                        }
                        state.broadcast(
                            &room,
                            &peer_id,
                            &SignalMessage::NewUser { peer_id: peer_id.clone() },
                        );
                    }
                    SignalMessage::Leave { peer_id } => {
                        // A session may only retire the identity it joined
                        // with; leaves naming other peers are dropped.
                        let owns_identity = registered
                            .lock()
                            .map(|slot| slot.as_ref() == Some(&peer_id))
                            .unwrap_or(false);
                        if !owns_identity {
                            warn!(room = %room, peer = %peer_id, "leave for foreign identity dropped");
                            continue;
                        }
                        if state.unregister(&room, &peer_id) {
                            state.broadcast(
                                &room,
                                &peer_id,
                                &SignalMessage::Leave { peer_id: peer_id.clone() },
                            );
                        }
                        if let Ok(mut slot) = registered.lock() {
                            *slot = None;
                        }
                    }
                    other => debug!(room = %room, "client-bound message ignored: {other:?}"),
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Socket gone without an explicit leave: drop the membership and tell
    // the rest of the room.
    let departed = registered.lock().ok().and_then(|mut slot| slot.take());
    if let Some(peer_id) = departed {
        if state.unregister(&room, &peer_id) {
            state.broadcast(
                &room,
                &peer_id,
                &SignalMessage::Leave { peer_id: peer_id.clone() },
            );
        }
        info!(room = %room, peer = %peer_id, "signaling connection closed");
    } else {
        info!(room = %room, "signaling connection closed before join");
    }
}
