use crate::config::MeshConfig;
use crate::error::MeshError;
use crate::media::{AudioOutput, CaptureGuard, LocalAudio, MediaCapture};
use crate::mesh::local_policy::LocalPolicy;
use crate::mesh::mesh_command::MeshCommand;
use crate::mesh::mesh_event::{DisconnectReason, MeshEvent};
use crate::mesh::peer_table::{PeerConnectionTable, PeerEntry, PeerState, Role};
use crate::mesh::reconciler::reconcile;
use crate::negotiation::{Opening, PeerCommand, PeerEvent, PeerTask, PeerTaskHandle};
use crate::signaling::SignalingSink;
use crate::transport::TransportFactory;
use earshot_core::{ClientMessage, NearbySet, ParticipantId, Position, ServerMessage};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Point-in-time view of the client state.
#[derive(Debug, Clone)]
pub struct MeshSnapshot {
    pub local_id: ParticipantId,
    pub peers: BTreeMap<ParticipantId, PeerState>,
    pub muted: BTreeSet<ParticipantId>,
    pub blocked: BTreeSet<ParticipantId>,
    pub nearby: NearbySet,
    pub last_seq: u64,
}

impl MeshSnapshot {
    pub fn connected(&self) -> Vec<ParticipantId> {
        self.peers
            .iter()
            .filter(|(_, state)| **state == PeerState::Connected)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn state_of(&self, peer_id: &ParticipantId) -> Option<PeerState> {
        self.peers.get(peer_id).copied()
    }
}

/// Cloneable front end to a running [`MeshClient`].
#[derive(Clone)]
pub struct MeshHandle {
    local_id: ParticipantId,
    command_tx: mpsc::UnboundedSender<MeshCommand>,
}

impl MeshHandle {
    pub fn id(&self) -> ParticipantId {
        self.local_id
    }

    pub fn update_position(&self, position: Position) -> Result<(), MeshError> {
        self.send(MeshCommand::UpdatePosition(position))
    }

    pub fn block(&self, peer_id: ParticipantId) -> Result<(), MeshError> {
        self.send(MeshCommand::Block(peer_id))
    }

    pub fn unblock(&self, peer_id: ParticipantId) -> Result<(), MeshError> {
        self.send(MeshCommand::Unblock(peer_id))
    }

    pub fn mute(&self, peer_id: ParticipantId) -> Result<(), MeshError> {
        self.send(MeshCommand::Mute(peer_id))
    }

    pub fn unmute(&self, peer_id: ParticipantId) -> Result<(), MeshError> {
        self.send(MeshCommand::Unmute(peer_id))
    }

    pub fn report(
        &self,
        reported_id: ParticipantId,
        reported_username: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<(), MeshError> {
        self.send(MeshCommand::Report {
            reported_id,
            reported_username: reported_username.into(),
            reason: reason.into(),
        })
    }

    pub async fn snapshot(&self) -> Result<MeshSnapshot, MeshError> {
        let (tx, rx) = oneshot::channel();
        self.send(MeshCommand::Snapshot(tx))?;
        rx.await.map_err(|_| MeshError::SignalingClosed)
    }

    /// Tears down every peer, leaves voice and releases the microphone.
    /// Resolves once all of that is done.
    pub async fn leave(&self) -> Result<(), MeshError> {
        let (done, rx) = oneshot::channel();
        self.send(MeshCommand::Leave { done })?;
        rx.await.map_err(|_| MeshError::SignalingClosed)
    }

    fn send(&self, cmd: MeshCommand) -> Result<(), MeshError> {
        self.command_tx
            .send(cmd)
            .map_err(|_| MeshError::SignalingClosed)
    }
}

/// Collaborators the client drives but does not own the implementation of.
#[derive(Clone)]
pub struct MeshMedia {
    pub capture: Arc<dyn MediaCapture>,
    pub transport: Arc<dyn TransportFactory>,
    pub audio: Arc<dyn AudioOutput>,
}

/// Per-participant actor. Owns the connection table and the local policy and
/// runs every handler to completion before taking the next input.
pub struct MeshClient {
    local_id: ParticipantId,
    config: MeshConfig,
    signaling: Arc<dyn SignalingSink>,
    transport: Arc<dyn TransportFactory>,
    audio: Arc<dyn AudioOutput>,
    /// Held while in voice. The loop stops once `shutdown` releases it.
    capture: Option<CaptureGuard>,
    local_audio: LocalAudio,
    table: PeerConnectionTable,
    policy: LocalPolicy,
    nearby: NearbySet,
    last_seq: u64,
    /// Highest attempt this side has offered, per peer.
    local_attempts: HashMap<ParticipantId, u64>,
    /// Highest attempt seen in an offer from each peer.
    remote_attempts: HashMap<ParticipantId, u64>,
    peer_tx: mpsc::UnboundedSender<PeerEvent>,
    events: mpsc::UnboundedSender<MeshEvent>,
    closing: Vec<JoinHandle<()>>,
}

impl MeshClient {
    /// Enters voice.
    ///
    /// The microphone is acquired before anything is sent; if that fails the
    /// error is returned and the coordinator never hears from this client.
    /// `inbound` must be the coordinator stream of a fresh connection, so the
    /// welcome carrying the local id is still ahead.
    pub async fn join(
        config: MeshConfig,
        signaling: Arc<dyn SignalingSink>,
        mut inbound: mpsc::UnboundedReceiver<ServerMessage>,
        media: MeshMedia,
        username: impl Into<String>,
    ) -> Result<(MeshHandle, mpsc::UnboundedReceiver<MeshEvent>), MeshError> {
        let capture = CaptureGuard::acquire(media.capture).await?;

        let local_id =
            Self::await_welcome(&mut inbound, media.transport.as_ref(), &config).await?;
        let username = username.into();
        signaling
            .send(ClientMessage::JoinVoice {
                username: username.clone(),
            })
            .await?;
        info!("Joined voice as {} ('{}')", local_id, username);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        let client = MeshClient {
            local_id,
            config,
            signaling,
            transport: media.transport,
            audio: media.audio,
            local_audio: capture.audio().clone(),
            capture: Some(capture),
            table: PeerConnectionTable::new(),
            policy: LocalPolicy::new(),
            nearby: NearbySet::new(),
            last_seq: 0,
            local_attempts: HashMap::new(),
            remote_attempts: HashMap::new(),
            peer_tx,
            events: event_tx,
            closing: Vec::new(),
        };
        tokio::spawn(client.run(inbound, command_rx, peer_rx));

        Ok((
            MeshHandle {
                local_id,
                command_tx,
            },
            event_rx,
        ))
    }

    async fn await_welcome(
        inbound: &mut mpsc::UnboundedReceiver<ServerMessage>,
        transport: &dyn TransportFactory,
        config: &MeshConfig,
    ) -> Result<ParticipantId, MeshError> {
        let deadline = Instant::now() + config.welcome_timeout;
        loop {
            let msg = tokio::time::timeout_at(deadline, inbound.recv())
                .await
                .map_err(|_| MeshError::SignalingClosed)?
                .ok_or(MeshError::SignalingClosed)?;

            match msg {
                ServerMessage::Welcome { participant_id } => return Ok(participant_id),
                ServerMessage::IceConfig { ice_servers } => transport.configure_ice(&ice_servers),
                other => debug!("Ignoring {:?} before welcome", other),
            }
        }
    }

    async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<ServerMessage>,
        mut commands: mpsc::UnboundedReceiver<MeshCommand>,
        mut peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    ) {
        loop {
            let result = tokio::select! {
                msg = inbound.recv() => match msg {
                    Some(msg) => self.handle_server_message(msg).await,
                    None => {
                        warn!("Signaling channel closed, leaving voice");
                        self.shutdown(false).await;
                        break;
                    }
                },

                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        self.shutdown(true).await;
                        break;
                    }
                },

                Some(event) = peer_rx.recv() => self.handle_peer_event(event).await,
            };

            if let Err(e) = result {
                warn!("{}", e);
            }
            if self.capture.is_none() {
                break;
            }
        }

        info!("Mesh client {} stopped", self.local_id);
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) -> Result<(), MeshError> {
        match msg {
            ServerMessage::Welcome { participant_id } => {
                debug!("Duplicate welcome for {}", participant_id);
            }

            ServerMessage::IceConfig { ice_servers } => {
                self.transport.configure_ice(&ice_servers);
            }

            ServerMessage::NearbyUsers { seq, users } => {
                self.apply_nearby(seq, users).await?;
            }

            ServerMessage::VoiceOffer {
                from,
                offer,
                attempt,
            } => {
                self.handle_remote_offer(from, offer, attempt).await?;
            }

            ServerMessage::VoiceAnswer {
                from,
                answer,
                attempt,
            } => {
                self.handle_remote_answer(from, answer, attempt)?;
            }

            ServerMessage::VoiceCandidate {
                from,
                candidate,
                attempt,
            } => {
                let entry = self.table.get(&from).ok_or(MeshError::UnknownPeer(from))?;
                if entry.attempt != attempt {
                    debug!(
                        "Discarding candidate from {} for attempt {} (current {})",
                        from, attempt, entry.attempt
                    );
                    return Ok(());
                }
                if let Some(task) = &entry.task {
                    task.send(PeerCommand::RemoteCandidate(candidate));
                }
            }

            ServerMessage::VoiceHangup { from } => {
                info!("{} hung up", from);
                self.teardown(from, DisconnectReason::RemoteHangup);
            }

            ServerMessage::VoiceRequest { from } => {
                self.handle_connect_request(from)?;
            }

            ServerMessage::PeerLeft { id } => {
                self.teardown(id, DisconnectReason::RemoteLeft);
                self.local_attempts.remove(&id);
                self.remote_attempts.remove(&id);
            }

            ServerMessage::ReportAccepted => {
                info!("Coordinator accepted report");
            }
        }

        Ok(())
    }

    async fn apply_nearby(&mut self, seq: u64, users: NearbySet) -> Result<(), MeshError> {
        if seq <= self.last_seq {
            return Err(MeshError::StaleNotification {
                received: seq,
                current: self.last_seq,
            });
        }
        self.last_seq = seq;
        self.nearby = users;
        self.emit(MeshEvent::NearbyChanged(self.nearby.clone()));

        self.reconcile().await;
        Ok(())
    }

    async fn reconcile(&mut self) {
        let plan = reconcile(self.local_id, &self.nearby, &self.policy, self.table.keys());
        if plan.is_empty() {
            return;
        }
        debug!(
            "Reconciling: connect {:?}, disconnect {:?}",
            plan.to_connect, plan.to_disconnect
        );

        for peer_id in plan.to_disconnect {
            self.teardown(peer_id, DisconnectReason::OutOfRange);
        }

        for peer_id in plan.to_connect {
            // The other side offers. Its own view may not have changed, so ask.
            if !self.local_id.initiates_with(&peer_id) {
                self.signal(ClientMessage::VoiceRequest { to: peer_id }).await;
                continue;
            }
            if let Err(e) = self.start_offer(peer_id) {
                warn!("Could not start negotiation with {}: {}", peer_id, e);
            }
        }
    }

    /// The answering side of a pair wants a session. Offer unless one is
    /// already underway or the requester is not eligible here.
    fn handle_connect_request(&mut self, from: ParticipantId) -> Result<(), MeshError> {
        if !self.local_id.initiates_with(&from)
            || self.policy.is_blocked(&from)
            || !self.nearby.contains(&from)
            || self.table.contains(&from)
        {
            debug!("Ignoring connect request from {}", from);
            return Ok(());
        }
        self.start_offer(from)
    }

    fn start_offer(&mut self, peer_id: ParticipantId) -> Result<(), MeshError> {
        let previous = self
            .local_attempts
            .get(&peer_id)
            .copied()
            .max(self.remote_attempts.get(&peer_id).copied())
            .unwrap_or(0);
        let attempt = previous + 1;

        self.table
            .insert(PeerEntry::new(peer_id, Role::Initiator, attempt))?;
        self.local_attempts.insert(peer_id, attempt);
        self.table.transition(&peer_id, PeerState::Offering)?;

        let task = self.spawn_peer_task(peer_id, attempt, Opening::Offer);
        if let Some(entry) = self.table.get_mut(&peer_id) {
            entry.task = Some(task);
        }
        info!("Offering to {} (attempt {})", peer_id, attempt);
        Ok(())
    }

    async fn handle_remote_offer(
        &mut self,
        from: ParticipantId,
        offer: String,
        attempt: u64,
    ) -> Result<(), MeshError> {
        if self.policy.is_blocked(&from) {
            info!("Refusing offer from blocked peer {}", from);
            self.signal(ClientMessage::VoiceHangup { to: from }).await;
            return Ok(());
        }

        // The coordinator notifies both sides before relaying any offer, so an
        // offer from outside the nearby set belongs to a session the sender
        // has already dropped.
        if !self.nearby.contains(&from) {
            debug!("Ignoring offer from {} which is not nearby", from);
            return Ok(());
        }

        if let Some(seen) = self.remote_attempts.get(&from)
            && attempt <= *seen
        {
            debug!(
                "Ignoring duplicate offer from {} (attempt {}, seen {})",
                from, attempt, seen
            );
            return Ok(());
        }
        self.remote_attempts.insert(from, attempt);

        if let Some(role) = self.table.get(&from).map(|entry| entry.role) {
            if role == Role::Initiator && self.local_id.initiates_with(&from) {
                debug!("Offer glare with {}, keeping local offer", from);
                return Ok(());
            }
            self.teardown(from, DisconnectReason::Superseded);
        }

        self.table
            .insert(PeerEntry::new(from, Role::Answerer, attempt))?;
        self.table.transition(&from, PeerState::AnsweringPending)?;

        let task = self.spawn_peer_task(from, attempt, Opening::Answer { offer });
        if let Some(entry) = self.table.get_mut(&from) {
            entry.task = Some(task);
        }
        info!("Answering offer from {} (attempt {})", from, attempt);
        Ok(())
    }

    fn handle_remote_answer(
        &mut self,
        from: ParticipantId,
        answer: String,
        attempt: u64,
    ) -> Result<(), MeshError> {
        let entry = self.table.get(&from).ok_or(MeshError::UnknownPeer(from))?;
        if entry.role != Role::Initiator
            || entry.state != PeerState::AnsweringPending
            || entry.attempt != attempt
        {
            debug!(
                "Ignoring answer from {} (attempt {}, entry {:?}/{:?}/{})",
                from, attempt, entry.role, entry.state, entry.attempt
            );
            return Ok(());
        }

        if let Some(task) = &entry.task {
            task.send(PeerCommand::RemoteAnswer(answer));
        }
        self.mark_connected(from)
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) -> Result<(), MeshError> {
        let peer_id = event.peer_id();
        let Some(entry) = self.table.get(&peer_id) else {
            debug!("Dropping event for closed peer {}", peer_id);
            return Ok(());
        };
        if entry.attempt != event.attempt() {
            debug!(
                "Dropping event from superseded attempt {} for {}",
                event.attempt(),
                peer_id
            );
            return Ok(());
        }

        match event {
            PeerEvent::OfferReady { attempt, sdp, .. } => {
                self.table
                    .transition(&peer_id, PeerState::AnsweringPending)?;
                self.signal(ClientMessage::VoiceOffer {
                    to: peer_id,
                    offer: sdp,
                    attempt,
                })
                .await;
            }

            PeerEvent::AnswerReady { attempt, sdp, .. } => {
                self.signal(ClientMessage::VoiceAnswer {
                    to: peer_id,
                    answer: sdp,
                    attempt,
                })
                .await;
            }

            PeerEvent::AnswerApplied { .. } => {
                debug!("Remote answer from {} applied", peer_id);
            }

            PeerEvent::LocalCandidate {
                attempt, candidate, ..
            } => {
                self.signal(ClientMessage::VoiceCandidate {
                    to: peer_id,
                    candidate,
                    attempt,
                })
                .await;
            }

            PeerEvent::MediaFlowing { .. } => {
                self.media_flowing(peer_id)?;
            }

            PeerEvent::RemoteMedia { audio, .. } => {
                let muted = self.policy.is_muted(&peer_id);
                self.audio.attach(peer_id, audio, muted);
                if let Some(entry) = self.table.get_mut(&peer_id) {
                    entry.audio_attached = true;
                }
                self.media_flowing(peer_id)?;
            }

            PeerEvent::Failed { error, .. } => {
                error!("Connection with {} failed: {}", peer_id, error);
                self.teardown(peer_id, DisconnectReason::Failed(error));
            }
        }

        Ok(())
    }

    /// Answerer side reaches `Connected` once media flows.
    fn media_flowing(&mut self, peer_id: ParticipantId) -> Result<(), MeshError> {
        let pending_answerer = self.table.get(&peer_id).is_some_and(|entry| {
            entry.role == Role::Answerer && entry.state == PeerState::AnsweringPending
        });
        if pending_answerer {
            self.mark_connected(peer_id)?;
        }
        Ok(())
    }

    fn mark_connected(&mut self, peer_id: ParticipantId) -> Result<(), MeshError> {
        self.table.transition(&peer_id, PeerState::Connected)?;
        info!("Voice connected with {}", peer_id);
        self.emit(MeshEvent::PeerConnected(peer_id));
        Ok(())
    }

    async fn handle_command(&mut self, cmd: MeshCommand) -> Result<(), MeshError> {
        match cmd {
            MeshCommand::UpdatePosition(position) => {
                self.signal(ClientMessage::AvatarPosition {
                    x: position.x,
                    z: position.z,
                })
                .await;
            }

            MeshCommand::Block(peer_id) => {
                if self.policy.block(peer_id) {
                    info!("Blocked {}", peer_id);
                }
                if self.teardown(peer_id, DisconnectReason::Blocked) {
                    self.signal(ClientMessage::VoiceHangup { to: peer_id }).await;
                }
            }

            MeshCommand::Unblock(peer_id) => {
                if self.policy.unblock(&peer_id) {
                    info!("Unblocked {}", peer_id);
                }
            }

            MeshCommand::Mute(peer_id) => {
                self.policy.mute(peer_id);
                self.apply_mute(peer_id, true);
            }

            MeshCommand::Unmute(peer_id) => {
                self.policy.unmute(&peer_id);
                self.apply_mute(peer_id, false);
            }

            MeshCommand::Report {
                reported_id,
                reported_username,
                reason,
            } => {
                self.signal(ClientMessage::ReportUser {
                    reported_id,
                    reported_username,
                    reason,
                })
                .await;
            }

            MeshCommand::Snapshot(tx) => {
                let _ = tx.send(self.snapshot());
            }

            MeshCommand::Leave { done } => {
                self.shutdown(true).await;
                let _ = done.send(());
            }
        }

        Ok(())
    }

    fn apply_mute(&self, peer_id: ParticipantId, muted: bool) {
        if self
            .table
            .get(&peer_id)
            .is_some_and(|entry| entry.audio_attached)
        {
            self.audio.set_muted(peer_id, muted);
        }
    }

    /// Closes and removes the entry for `peer_id`. Returns `false` if there
    /// was none.
    fn teardown(&mut self, peer_id: ParticipantId, reason: DisconnectReason) -> bool {
        if !self.table.contains(&peer_id) {
            return false;
        }
        if let Err(e) = self.table.transition(&peer_id, PeerState::Closing) {
            warn!("{}", e);
        }
        let Some(entry) = self.table.remove(&peer_id) else {
            return false;
        };

        if let Some(task) = entry.task {
            self.closing.retain(|handle| !handle.is_finished());
            self.closing.push(task.close());
        }
        if entry.audio_attached {
            self.audio.detach(peer_id);
        }

        info!("Disconnected from {}: {:?}", peer_id, reason);
        self.emit(MeshEvent::PeerDisconnected { peer_id, reason });
        true
    }

    async fn shutdown(&mut self, announce: bool) {
        let peers: Vec<ParticipantId> = self.table.keys().copied().collect();
        for peer_id in peers {
            self.teardown(peer_id, DisconnectReason::LocalLeave);
        }

        if announce {
            self.signal(ClientMessage::LeaveVoice).await;
        }

        let closing = std::mem::take(&mut self.closing);
        if tokio::time::timeout(
            self.config.close_timeout,
            futures::future::join_all(closing),
        )
        .await
        .is_err()
        {
            warn!("Timed out waiting for peer sessions to close");
        }

        drop(self.capture.take());
        info!("Left voice");
        self.emit(MeshEvent::Left);
    }

    fn spawn_peer_task(
        &self,
        peer_id: ParticipantId,
        attempt: u64,
        opening: Opening,
    ) -> PeerTaskHandle {
        PeerTask::spawn(
            peer_id,
            attempt,
            opening,
            Arc::clone(&self.transport),
            self.local_audio.clone(),
            self.peer_tx.clone(),
            self.config.negotiation_timeout,
        )
    }

    fn snapshot(&self) -> MeshSnapshot {
        MeshSnapshot {
            local_id: self.local_id,
            peers: self
                .table
                .iter()
                .map(|entry| (entry.peer_id, entry.state))
                .collect(),
            muted: self.policy.muted().clone(),
            blocked: self.policy.blocked().clone(),
            nearby: self.nearby.clone(),
            last_seq: self.last_seq,
        }
    }

    async fn signal(&self, msg: ClientMessage) {
        if let Err(e) = self.signaling.send(msg).await {
            warn!("Failed to send signal: {}", e);
        }
    }

    fn emit(&self, event: MeshEvent) {
        let _ = self.events.send(event);
    }
}
