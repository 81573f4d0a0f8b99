use crate::error::MeshError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Handle to the local microphone stream attached to every outgoing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAudio {
    pub stream_id: String,
}

/// Local audio capture collaborator (microphone access).
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Fails with [`MeshError::MediaAcquisitionDenied`] when the device is
    /// unavailable or permission is refused.
    async fn acquire(&self) -> Result<LocalAudio, MeshError>;

    fn release(&self, audio: &LocalAudio);
}

/// Holds the capture for as long as the participant is in voice. Dropping it
/// releases the device, whichever way the session ends.
pub struct CaptureGuard {
    capture: Arc<dyn MediaCapture>,
    audio: LocalAudio,
}

impl CaptureGuard {
    pub async fn acquire(capture: Arc<dyn MediaCapture>) -> Result<Self, MeshError> {
        let audio = capture.acquire().await?;
        info!("Local audio capture acquired: {}", audio.stream_id);
        Ok(Self { capture, audio })
    }

    pub fn audio(&self) -> &LocalAudio {
        &self.audio
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        info!("Releasing local audio capture: {}", self.audio.stream_id);
        self.capture.release(&self.audio);
    }
}
