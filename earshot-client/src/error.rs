use crate::mesh::PeerState;
use earshot_core::ParticipantId;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("message references peer {0} which is not in the connection table")]
    UnknownPeer(ParticipantId),

    #[error("nearby notification {received} is not newer than {current}")]
    StaleNotification { received: u64, current: u64 },

    #[error("negotiation with {0} timed out")]
    NegotiationTimeout(ParticipantId),

    #[error("local audio capture unavailable: {0}")]
    MediaAcquisitionDenied(String),

    #[error("transport failure with {peer_id}: {reason}")]
    TransportFailure {
        peer_id: ParticipantId,
        reason: String,
    },

    #[error("signaling channel unavailable: {0}")]
    SignalingUnavailable(String),

    #[error("signaling channel closed")]
    SignalingClosed,

    #[error("peer {peer_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        peer_id: ParticipantId,
        from: PeerState,
        to: PeerState,
    },

    #[error("peer {0} already has a connection entry")]
    DuplicatePeer(ParticipantId),
}
