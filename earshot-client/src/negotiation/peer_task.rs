use crate::error::MeshError;
use crate::media::{LocalAudio, RemoteAudio};
use crate::negotiation::candidate_buffer::CandidateBuffer;
use crate::transport::{SdpKind, TransportEvent, TransportFactory, TransportSession};
use earshot_core::ParticipantId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How a peer session starts.
#[derive(Debug, Clone)]
pub enum Opening {
    /// Local side is the designated initiator.
    Offer,
    /// Local side answers an offer that already arrived.
    Answer { offer: String },
}

/// Instructions from the client loop, applied in the order they were sent.
#[derive(Debug)]
pub enum PeerCommand {
    RemoteAnswer(String),
    RemoteCandidate(String),
    Close,
}

/// Progress reported back to the client loop. Each event carries the attempt
/// it belongs to so results of a superseded session can be ignored.
#[derive(Debug)]
pub enum PeerEvent {
    OfferReady {
        peer_id: ParticipantId,
        attempt: u64,
        sdp: String,
    },
    AnswerReady {
        peer_id: ParticipantId,
        attempt: u64,
        sdp: String,
    },
    AnswerApplied {
        peer_id: ParticipantId,
        attempt: u64,
    },
    LocalCandidate {
        peer_id: ParticipantId,
        attempt: u64,
        candidate: String,
    },
    MediaFlowing {
        peer_id: ParticipantId,
        attempt: u64,
    },
    RemoteMedia {
        peer_id: ParticipantId,
        attempt: u64,
        audio: RemoteAudio,
    },
    Failed {
        peer_id: ParticipantId,
        attempt: u64,
        error: MeshError,
    },
}

impl PeerEvent {
    pub fn peer_id(&self) -> ParticipantId {
        match self {
            PeerEvent::OfferReady { peer_id, .. }
            | PeerEvent::AnswerReady { peer_id, .. }
            | PeerEvent::AnswerApplied { peer_id, .. }
            | PeerEvent::LocalCandidate { peer_id, .. }
            | PeerEvent::MediaFlowing { peer_id, .. }
            | PeerEvent::RemoteMedia { peer_id, .. }
            | PeerEvent::Failed { peer_id, .. } => *peer_id,
        }
    }

    pub fn attempt(&self) -> u64 {
        match self {
            PeerEvent::OfferReady { attempt, .. }
            | PeerEvent::AnswerReady { attempt, .. }
            | PeerEvent::AnswerApplied { attempt, .. }
            | PeerEvent::LocalCandidate { attempt, .. }
            | PeerEvent::MediaFlowing { attempt, .. }
            | PeerEvent::RemoteMedia { attempt, .. }
            | PeerEvent::Failed { attempt, .. } => *attempt,
        }
    }
}

/// Client-side handle to a running peer task.
pub struct PeerTaskHandle {
    command_tx: mpsc::UnboundedSender<PeerCommand>,
    join: JoinHandle<()>,
}

impl PeerTaskHandle {
    /// Returns `false` when the task has already finished.
    pub fn send(&self, cmd: PeerCommand) -> bool {
        self.command_tx.send(cmd).is_ok()
    }

    /// Asks the task to close its session. The returned handle resolves once
    /// the session is closed.
    pub fn close(self) -> JoinHandle<()> {
        let _ = self.command_tx.send(PeerCommand::Close);
        self.join
    }
}

/// Owns the transport session for one peer and one negotiation attempt.
///
/// Session setup, offer/answer generation and candidate application run
/// here so a slow peer never stalls signaling for the others.
pub struct PeerTask {
    peer_id: ParticipantId,
    attempt: u64,
    factory: Arc<dyn TransportFactory>,
    local_audio: LocalAudio,
    events: mpsc::UnboundedSender<PeerEvent>,
    timeout: Duration,
    candidates: CandidateBuffer,
}

impl PeerTask {
    pub fn spawn(
        peer_id: ParticipantId,
        attempt: u64,
        opening: Opening,
        factory: Arc<dyn TransportFactory>,
        local_audio: LocalAudio,
        events: mpsc::UnboundedSender<PeerEvent>,
        timeout: Duration,
    ) -> PeerTaskHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = PeerTask {
            peer_id,
            attempt,
            factory,
            local_audio,
            events,
            timeout,
            candidates: CandidateBuffer::new(),
        };
        let join = tokio::spawn(task.run(opening, command_rx));

        PeerTaskHandle { command_tx, join }
    }

    async fn run(mut self, opening: Opening, mut commands: mpsc::UnboundedReceiver<PeerCommand>) {
        let deadline = Instant::now() + self.timeout;
        let (transport_tx, mut transport_rx) = mpsc::channel(64);

        let session = match tokio::time::timeout_at(
            deadline,
            self.open_session(opening, transport_tx),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                self.fail(MeshError::TransportFailure {
                    peer_id: self.peer_id,
                    reason: format!("{:#}", e),
                });
                return;
            }
            Err(_) => {
                self.fail(MeshError::NegotiationTimeout(self.peer_id));
                return;
            }
        };

        let mut connected = false;
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(PeerCommand::RemoteAnswer(sdp)) => {
                        if let Err(e) = self.apply_remote_answer(session.as_ref(), sdp).await {
                            self.fail(MeshError::TransportFailure {
                                peer_id: self.peer_id,
                                reason: format!("{:#}", e),
                            });
                            break;
                        }
                        connected = true;
                        self.emit(PeerEvent::AnswerApplied {
                            peer_id: self.peer_id,
                            attempt: self.attempt,
                        });
                    }
                    Some(PeerCommand::RemoteCandidate(candidate)) => {
                        if let Some(candidate) = self.candidates.push(candidate) {
                            self.apply_candidate(session.as_ref(), candidate).await;
                        }
                    }
                    Some(PeerCommand::Close) | None => break,
                },

                Some(event) = transport_rx.recv() => match event {
                    TransportEvent::CandidateGenerated(_, candidate) => {
                        self.emit(PeerEvent::LocalCandidate {
                            peer_id: self.peer_id,
                            attempt: self.attempt,
                            candidate,
                        });
                    }
                    TransportEvent::MediaFlowing(_) => {
                        connected = true;
                        self.emit(PeerEvent::MediaFlowing {
                            peer_id: self.peer_id,
                            attempt: self.attempt,
                        });
                    }
                    TransportEvent::RemoteMedia(_, audio) => {
                        connected = true;
                        self.emit(PeerEvent::RemoteMedia {
                            peer_id: self.peer_id,
                            attempt: self.attempt,
                            audio,
                        });
                    }
                    TransportEvent::Failed(_, reason) => {
                        self.fail(MeshError::TransportFailure {
                            peer_id: self.peer_id,
                            reason,
                        });
                        break;
                    }
                },

                _ = tokio::time::sleep_until(deadline), if !connected => {
                    self.fail(MeshError::NegotiationTimeout(self.peer_id));
                    break;
                }
            }
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close session with {}: {:?}", self.peer_id, e);
        }
        debug!("Peer task for {} (attempt {}) finished", self.peer_id, self.attempt);
    }

    /// Creates the session, attaches local audio and produces the local
    /// description for `opening`.
    async fn open_session(
        &mut self,
        opening: Opening,
        transport_tx: mpsc::Sender<TransportEvent>,
    ) -> anyhow::Result<Box<dyn TransportSession>> {
        let session = self
            .factory
            .create_session(self.peer_id, transport_tx)
            .await?;

        if let Err(e) = self.negotiate_opening(session.as_ref(), opening).await {
            let _ = session.close().await;
            return Err(e);
        }
        Ok(session)
    }

    async fn negotiate_opening(
        &mut self,
        session: &dyn TransportSession,
        opening: Opening,
    ) -> anyhow::Result<()> {
        session.add_local_audio(&self.local_audio).await?;

        match opening {
            Opening::Offer => {
                let sdp = session.create_offer().await?;
                self.emit(PeerEvent::OfferReady {
                    peer_id: self.peer_id,
                    attempt: self.attempt,
                    sdp,
                });
            }
            Opening::Answer { offer } => {
                session.set_remote_description(SdpKind::Offer, offer).await?;
                for candidate in self.candidates.release() {
                    self.apply_candidate(session, candidate).await;
                }
                let sdp = session.create_answer().await?;
                self.emit(PeerEvent::AnswerReady {
                    peer_id: self.peer_id,
                    attempt: self.attempt,
                    sdp,
                });
            }
        }
        Ok(())
    }

    async fn apply_remote_answer(
        &mut self,
        session: &dyn TransportSession,
        sdp: String,
    ) -> anyhow::Result<()> {
        session.set_remote_description(SdpKind::Answer, sdp).await?;
        for candidate in self.candidates.release() {
            self.apply_candidate(session, candidate).await;
        }
        Ok(())
    }

    async fn apply_candidate(&self, session: &dyn TransportSession, candidate: String) {
        if let Err(e) = session.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {}: {:?}", self.peer_id, e);
        }
    }

    fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(event);
    }

    fn fail(&self, error: MeshError) {
        warn!("Peer session with {} failed: {}", self.peer_id, error);
        self.emit(PeerEvent::Failed {
            peer_id: self.peer_id,
            attempt: self.attempt,
            error,
        });
    }
}
