use crate::error::MeshError;
use crate::signaling::signaling_sink::SignalingSink;
use async_trait::async_trait;
use earshot_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

/// WebSocket connection to the coordinator.
#[derive(Clone)]
pub struct WsSignaling {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl WsSignaling {
    /// Connects to `url` (e.g. `ws://host:5000/ws`) and returns the outbound
    /// sink together with the stream of coordinator messages. The stream ends
    /// when the socket closes.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerMessage>), MeshError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| MeshError::SignalingUnavailable(e.to_string()))?;
        info!("Connected to coordinator at {}", url);

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize signal message: {}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<ServerMessage>(text.as_str()) {
                            Ok(signal) => {
                                if in_tx.send(signal).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid ServerMessage: {:?}", e),
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Coordinator connection closed");
        });

        Ok((Self { tx: out_tx }, in_rx))
    }
}

#[async_trait]
impl SignalingSink for WsSignaling {
    async fn send(&self, msg: ClientMessage) -> Result<(), MeshError> {
        self.tx.send(msg).map_err(|_| MeshError::SignalingClosed)
    }
}
