use crate::coordinator::CoordinatorCommand;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use earshot_core::{IceServerConfig, ParticipantId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    participants: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Registry of open WebSocket connections, shared by every socket task.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) coordinator_tx: mpsc::Sender<CoordinatorCommand>,
}

impl SignalingService {
    pub fn new(
        coordinator_tx: mpsc::Sender<CoordinatorCommand>,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                participants: DashMap::new(),
                ice_servers,
            }),
            coordinator_tx,
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_participant(&self, id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.participants.insert(id, tx);
    }

    pub fn remove_participant(&self, id: &ParticipantId) {
        self.inner.participants.remove(id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.participants.len()
    }

    pub fn send_signal(&self, id: ParticipantId, msg: &ServerMessage) {
        let Some(conn) = self.inner.participants.get(&id) else {
            warn!("Attempted to send signal to disconnected participant {}", id);
            return;
        };

        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = conn.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {:?}", id, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, participant_id: ParticipantId, msg: ServerMessage) {
        self.send_signal(participant_id, &msg);
    }
}
