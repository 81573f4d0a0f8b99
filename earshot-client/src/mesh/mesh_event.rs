use crate::error::MeshError;
use earshot_core::{NearbySet, ParticipantId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    OutOfRange,
    Blocked,
    RemoteHangup,
    RemoteLeft,
    /// Replaced by a newer negotiation with the same peer.
    Superseded,
    LocalLeave,
    Failed(MeshError),
}

/// Notifications for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshEvent {
    PeerConnected(ParticipantId),
    PeerDisconnected {
        peer_id: ParticipantId,
        reason: DisconnectReason,
    },
    NearbyChanged(NearbySet),
    /// The loop has stopped, either on request or because signaling closed.
    Left,
}
