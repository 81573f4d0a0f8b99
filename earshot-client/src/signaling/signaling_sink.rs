use crate::error::MeshError;
use async_trait::async_trait;
use earshot_core::ClientMessage;

/// Outbound half of the signaling channel, client to coordinator.
#[async_trait]
pub trait SignalingSink: Send + Sync {
    async fn send(&self, msg: ClientMessage) -> Result<(), MeshError>;
}
