use earshot_core::{ClientMessage, ParticipantId, Position, ServerMessage};

/// Commands delivered to the coordinator by the signaling layer.
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// The connection asked to enter voice under a display name.
    Join {
        participant_id: ParticipantId,
        username: String,
    },

    /// Explicit leave; the socket stays open.
    Leave { participant_id: ParticipantId },

    UpdatePosition {
        participant_id: ParticipantId,
        position: Position,
    },

    /// Negotiation message already rewritten to carry `from`.
    Relay {
        from: ParticipantId,
        to: ParticipantId,
        message: ServerMessage,
    },

    Report {
        participant_id: ParticipantId,
        reported_id: ParticipantId,
        reported_username: String,
        reason: String,
    },

    /// The WebSocket closed. Implies leave.
    Disconnect { participant_id: ParticipantId },
}

impl CoordinatorCommand {
    /// Maps a parsed client message onto a coordinator command. Negotiation
    /// messages become relays addressed from `participant_id`.
    pub fn from_client(participant_id: ParticipantId, signal: ClientMessage) -> Option<Self> {
        let cmd = match signal {
            ClientMessage::JoinVoice { username } => CoordinatorCommand::Join {
                participant_id,
                username,
            },
            ClientMessage::LeaveVoice => CoordinatorCommand::Leave { participant_id },
            ClientMessage::AvatarPosition { x, z } => CoordinatorCommand::UpdatePosition {
                participant_id,
                position: Position::new(x, z),
            },
            ClientMessage::ReportUser {
                reported_id,
                reported_username,
                reason,
            } => CoordinatorCommand::Report {
                participant_id,
                reported_id,
                reported_username,
                reason,
            },
            negotiation => {
                let (to, message) = negotiation.into_relay(participant_id)?;
                CoordinatorCommand::Relay {
                    from: participant_id,
                    to,
                    message,
                }
            }
        };
        Some(cmd)
    }
}
