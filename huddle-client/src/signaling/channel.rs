use crate::error::SessionError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{RoomKey, SignalMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

enum ChannelCommand {
    Send(SignalMessage),
    Close,
}

/// Duplex message transport to the signaling relay, scoped to one room.
///
/// The channel performs no retry or reconnection on its own; reconnection
/// policy belongs to the room session. Inbound messages arrive on the
/// receiver returned by [`SignalingChannel::connect`] — a lazy,
/// non-restartable sequence that ends when the transport drops.
pub struct SignalingChannel {
    cmd_tx: mpsc::UnboundedSender<ChannelCommand>,
}

impl SignalingChannel {
    /// Open a WebSocket to `{endpoint}/ws/{room}` and split it into a writer
    /// task (fed by `send`) and a reader task (feeding the returned receiver).
    pub async fn connect(
        endpoint: &str,
        room: &RoomKey,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>), SessionError> {
        let url = format!("{}/ws/{}", endpoint.trim_end_matches('/'), room);
        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        info!(%url, "signaling channel connected");

        let (mut sink, mut stream) = ws.split();
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    ChannelCommand::Send(msg) => match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sink.send(Message::Text(json.into())).await.is_err() {
                                warn!("signaling transport closed, outbound message dropped");
                                break;
                            }
                        }
                        Err(e) => error!("failed to serialize signal message: {e}"),
                    },
                    ChannelCommand::Close => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SignalMessage>(text.as_str()) {
                            Ok(msg) => {
                                if in_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("dropping malformed signaling message: {e}"),
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("signaling channel closed by remote");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("signaling transport error: {e}");
                        break;
                    }
                }
            }
        });

        Ok((Self { cmd_tx }, in_rx))
    }

    /// Fire-and-forget send. Logged, not fatal, when the transport is gone.
    pub fn send(&self, msg: SignalMessage) {
        if self.cmd_tx.send(ChannelCommand::Send(msg)).is_err() {
            warn!("signaling channel not open, message dropped");
        }
    }

    /// Idempotent close; later calls and sends become no-ops.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(ChannelCommand::Close);
    }
}

#[async_trait]
impl SignalingOutput for SignalingChannel {
    async fn send(&self, msg: SignalMessage) {
        SignalingChannel::send(self, msg);
    }

    async fn close(&self) {
        SignalingChannel::close(self);
    }
}
