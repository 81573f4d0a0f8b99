use crate::model::nearby::NearbySet;
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Messages a participant sends to the coordinator.
///
/// Negotiation variants name their target with `to`; the coordinator rewrites
/// them into the matching [`ServerMessage`] carrying `from` before relaying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinVoice {
        username: String,
    },
    LeaveVoice,
    AvatarPosition {
        x: f64,
        z: f64,
    },
    VoiceOffer {
        to: ParticipantId,
        offer: String,
        #[serde(default)]
        attempt: u64,
    },
    VoiceAnswer {
        to: ParticipantId,
        answer: String,
        #[serde(default)]
        attempt: u64,
    },
    VoiceCandidate {
        to: ParticipantId,
        candidate: String,
        #[serde(default)]
        attempt: u64,
    },
    VoiceHangup {
        to: ParticipantId,
    },
    /// Asks the designated initiator of the pair to offer.
    VoiceRequest {
        to: ParticipantId,
    },
    ReportUser {
        reported_id: ParticipantId,
        reported_username: String,
        reason: String,
    },
}

impl ClientMessage {
    /// Rewrites a negotiation message for delivery to its target.
    ///
    /// Returns `None` for messages that are handled by the coordinator itself.
    pub fn into_relay(self, from: ParticipantId) -> Option<(ParticipantId, ServerMessage)> {
        match self {
            ClientMessage::VoiceOffer { to, offer, attempt } => Some((
                to,
                ServerMessage::VoiceOffer {
                    from,
                    offer,
                    attempt,
                },
            )),
            ClientMessage::VoiceAnswer {
                to,
                answer,
                attempt,
            } => Some((
                to,
                ServerMessage::VoiceAnswer {
                    from,
                    answer,
                    attempt,
                },
            )),
            ClientMessage::VoiceCandidate {
                to,
                candidate,
                attempt,
            } => Some((
                to,
                ServerMessage::VoiceCandidate {
                    from,
                    candidate,
                    attempt,
                },
            )),
            ClientMessage::VoiceHangup { to } => Some((to, ServerMessage::VoiceHangup { from })),
            ClientMessage::VoiceRequest { to } => Some((to, ServerMessage::VoiceRequest { from })),
            _ => None,
        }
    }
}

/// Messages the coordinator sends to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerMessage {
    Welcome {
        participant_id: ParticipantId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    NearbyUsers {
        seq: u64,
        users: NearbySet,
    },
    VoiceOffer {
        from: ParticipantId,
        offer: String,
        #[serde(default)]
        attempt: u64,
    },
    VoiceAnswer {
        from: ParticipantId,
        answer: String,
        #[serde(default)]
        attempt: u64,
    },
    VoiceCandidate {
        from: ParticipantId,
        candidate: String,
        #[serde(default)]
        attempt: u64,
    },
    VoiceHangup {
        from: ParticipantId,
    },
    VoiceRequest {
        from: ParticipantId,
    },
    PeerLeft {
        id: ParticipantId,
    },
    ReportAccepted,
}
