use earshot_core::ParticipantId;
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Decoded-stream handle for one remote peer.
#[derive(Clone)]
pub struct RemoteAudio {
    pub stream_id: String,
    /// The underlying RTP track when the session is backed by webrtc.
    pub track: Option<Arc<TrackRemote>>,
}

impl RemoteAudio {
    pub fn detached(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            track: None,
        }
    }
}

impl fmt::Debug for RemoteAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteAudio")
            .field("stream_id", &self.stream_id)
            .field("has_track", &self.track.is_some())
            .finish()
    }
}

/// Renders remote audio. Muting only gates audibility; connection state is
/// never touched from here.
pub trait AudioOutput: Send + Sync {
    fn attach(&self, peer_id: ParticipantId, audio: RemoteAudio, muted: bool);

    fn set_muted(&self, peer_id: ParticipantId, muted: bool);

    fn detach(&self, peer_id: ParticipantId);
}
