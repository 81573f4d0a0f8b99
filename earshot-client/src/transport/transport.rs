use crate::media::LocalAudio;
use crate::transport::transport_event::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use earshot_core::{IceServerConfig, ParticipantId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Media transport capability. One session per remote peer.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// `events` receives everything the session reports asynchronously
    /// (local candidates, media flow, remote streams, failures).
    async fn create_session(
        &self,
        peer_id: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn TransportSession>>;

    /// ICE servers announced by the coordinator, applied to later sessions.
    fn configure_ice(&self, _ice_servers: &[IceServerConfig]) {}
}

#[async_trait]
pub trait TransportSession: Send + Sync {
    async fn add_local_audio(&self, audio: &LocalAudio) -> Result<()>;

    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<String>;

    /// Creates an answer and installs it as the local description.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: String) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
