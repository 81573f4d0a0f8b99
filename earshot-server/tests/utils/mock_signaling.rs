use async_trait::async_trait;
use earshot_core::{ParticipantId, ServerMessage};
use earshot_server::SignalingOutput;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Mock SignalingOutput that captures everything the coordinator sends.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<(ParticipantId, ServerMessage)>,
    sent: Arc<Mutex<Vec<(ParticipantId, ServerMessage)>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(ParticipantId, ServerMessage)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let output = Self {
            tx,
            sent: Arc::new(Mutex::new(Vec::new())),
        };
        (output, rx)
    }

    /// Every nearby notification sent to `id`, oldest first.
    pub async fn nearby_for(&self, id: &ParticipantId) -> Vec<(u64, Vec<ParticipantId>)> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|(to, msg)| match msg {
                ServerMessage::NearbyUsers { seq, users } if to == id => {
                    Some((*seq, users.iter().map(|u| u.id).collect()))
                }
                _ => None,
            })
            .collect()
    }

    pub async fn sent_to(&self, id: &ParticipantId) -> Vec<ServerMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, participant_id: ParticipantId, msg: ServerMessage) {
        tracing::debug!("[MockSignaling] {:?} -> {}", msg, participant_id);

        self.sent.lock().await.push((participant_id, msg.clone()));
        let _ = self.tx.send((participant_id, msg));
    }
}
