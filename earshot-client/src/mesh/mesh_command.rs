use crate::mesh::mesh_client::MeshSnapshot;
use earshot_core::{ParticipantId, Position};
use tokio::sync::oneshot;

/// Local requests handled by the client loop.
#[derive(Debug)]
pub enum MeshCommand {
    UpdatePosition(Position),
    Block(ParticipantId),
    Unblock(ParticipantId),
    Mute(ParticipantId),
    Unmute(ParticipantId),
    Report {
        reported_id: ParticipantId,
        reported_username: String,
        reason: String,
    },
    Snapshot(oneshot::Sender<MeshSnapshot>),
    Leave {
        done: oneshot::Sender<()>,
    },
}
