use crate::coordinator::coordinator_command::CoordinatorCommand;
use crate::coordinator::coordinator_error::CoordinatorError;
use crate::coordinator::report_sink::{ReportSink, UserReport};
use crate::directory::{DEFAULT_MAX_DISTANCE, ProximityDirectory};
use crate::signaling::SignalingOutput;
use earshot_core::{NearbySet, ParticipantId, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Last nearby set pushed to a participant and the sequence number it carried.
#[derive(Default)]
struct NotificationState {
    seq: u64,
    last: Option<NearbySet>,
}

/// Single-writer actor owning the position table.
///
/// Every join, leave, move and relay is applied from this task in arrival
/// order, so nearby computations always see whole updates.
pub struct Coordinator {
    directory: ProximityDirectory,
    notifications: HashMap<ParticipantId, NotificationState>,
    command_rx: mpsc::Receiver<CoordinatorCommand>,
    signaling: Arc<dyn SignalingOutput>,
    reports: Arc<dyn ReportSink>,
    max_distance: f64,
}

impl Coordinator {
    pub fn new(
        command_rx: mpsc::Receiver<CoordinatorCommand>,
        signaling: Arc<dyn SignalingOutput>,
        reports: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            directory: ProximityDirectory::new(),
            notifications: HashMap::new(),
            command_rx,
            signaling,
            reports,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub async fn run(mut self) {
        info!(max_distance = self.max_distance, "Coordinator event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            if let Err(e) = self.handle_command(cmd).await {
                warn!("Coordinator rejected command: {}", e);
            }
        }

        info!("Command channel closed. Coordinator shutting down.");
    }

    async fn handle_command(&mut self, cmd: CoordinatorCommand) -> Result<(), CoordinatorError> {
        match cmd {
            CoordinatorCommand::Join {
                participant_id,
                username,
            } => {
                info!("Participant {} joined voice as '{}'", participant_id, username);
                self.directory.join(participant_id, username);
                self.refresh_nearby(None).await;
            }

            CoordinatorCommand::Leave { participant_id } => {
                self.remove_participant(&participant_id).await?;
            }

            CoordinatorCommand::Disconnect { participant_id } => {
                // A socket that never joined has nothing to clean up.
                if self.directory.contains(&participant_id) {
                    self.remove_participant(&participant_id).await?;
                }
                self.notifications.remove(&participant_id);
            }

            CoordinatorCommand::UpdatePosition {
                participant_id,
                position,
            } => {
                if !position.is_finite() {
                    return Err(CoordinatorError::InvalidPosition {
                        x: position.x,
                        z: position.z,
                    });
                }
                if !self.directory.update_position(&participant_id, position) {
                    return Err(CoordinatorError::NotJoined(participant_id));
                }
                self.refresh_nearby(Some(participant_id)).await;
            }

            CoordinatorCommand::Relay { from, to, message } => {
                if !self.directory.contains(&from) {
                    return Err(CoordinatorError::NotJoined(from));
                }
                if !self.directory.contains(&to) {
                    return Err(CoordinatorError::UnknownParticipant(to));
                }
                debug!("Relaying negotiation message {} -> {}", from, to);
                self.signaling.send(to, message).await;
            }

            CoordinatorCommand::Report {
                participant_id,
                reported_id,
                reported_username,
                reason,
            } => {
                let Some(reporter) = self.directory.get(&participant_id) else {
                    return Err(CoordinatorError::NotJoined(participant_id));
                };
                let report = UserReport {
                    reporter_id: participant_id,
                    reporter_username: reporter.username.clone(),
                    reported_id,
                    reported_username,
                    reason,
                    time: UserReport::now_millis(),
                };
                self.reports.submit(report).await;
                self.signaling
                    .send(participant_id, ServerMessage::ReportAccepted)
                    .await;
            }
        }

        Ok(())
    }

    async fn remove_participant(&mut self, id: &ParticipantId) -> Result<(), CoordinatorError> {
        if self.directory.leave(id).is_none() {
            return Err(CoordinatorError::NotJoined(*id));
        }
        // Keep the sequence so a re-join on the same connection continues it.
        if let Some(state) = self.notifications.get_mut(id) {
            state.last = None;
        }
        info!("Participant {} left voice", id);

        let remaining: Vec<ParticipantId> = self.directory.ids().copied().collect();
        for other in remaining {
            self.signaling
                .send(other, ServerMessage::PeerLeft { id: *id })
                .await;
        }

        self.refresh_nearby(None).await;
        Ok(())
    }

    /// Recomputes every nearby set and pushes those that changed. `mover`
    /// always receives a fresh notification since its own position changed.
    async fn refresh_nearby(&mut self, mover: Option<ParticipantId>) {
        let sets = self.directory.compute_all(self.max_distance);

        for (id, set) in sets {
            let state = self.notifications.entry(id).or_default();
            if state.last.as_ref() == Some(&set) && mover != Some(id) {
                continue;
            }

            state.seq += 1;
            state.last = Some(set.clone());
            let msg = ServerMessage::NearbyUsers {
                seq: state.seq,
                users: set,
            };
            self.signaling.send(id, msg).await;
        }
    }
}
