use crate::media::RemoteAudio;
use earshot_core::ParticipantId;

/// Events a transport session reports back to its peer task.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local ICE candidate to forward to the peer through signaling.
    CandidateGenerated(ParticipantId, String),

    /// The media path to the peer is up.
    MediaFlowing(ParticipantId),

    /// A decoded remote audio stream became available.
    RemoteMedia(ParticipantId, RemoteAudio),

    /// The session is unusable.
    Failed(ParticipantId, String),
}
