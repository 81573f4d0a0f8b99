use earshot_core::ParticipantId;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CoordinatorError {
    #[error("participant {0} has not joined voice")]
    NotJoined(ParticipantId),

    #[error("relay target {0} is not in voice")]
    UnknownParticipant(ParticipantId),

    #[error("position ({x}, {z}) is not finite")]
    InvalidPosition { x: f64, z: f64 },
}
