use async_trait::async_trait;
use earshot_core::{ParticipantId, ServerMessage};

/// Implemented by whatever holds the participant connections, so the
/// coordinator can push notifications and relays without knowing the transport.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver a message to one participant. Delivery to a participant that
    /// already disconnected is dropped.
    async fn send(&self, participant_id: ParticipantId, msg: ServerMessage);
}
