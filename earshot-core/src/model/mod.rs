mod nearby;
mod participant;
mod position;
mod signaling;

pub use nearby::{NearbySet, NearbyUser};
pub use participant::ParticipantId;
pub use position::Position;
pub use signaling::{ClientMessage, IceServerConfig, ServerMessage};
