use async_trait::async_trait;
use earshot_client::{
    LocalAudio, RemoteAudio, SdpKind, TransportEvent, TransportFactory, TransportSession,
};
use earshot_core::{IceServerConfig, ParticipantId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Media flows as soon as both descriptions are in place.
    Connects,
    /// `create_session` errors.
    FailsToOpen,
    /// Descriptions are exchanged but media never flows.
    Stalls,
    /// The connection drops right after the descriptions are in place.
    DropsAfterNegotiation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Create,
    AddLocalAudio,
    CreateOffer,
    CreateAnswer,
    SetRemote(SdpKind, String),
    AddCandidate(String),
    Close,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub peer_id: ParticipantId,
    pub session: u64,
    pub call: TransportCall,
}

struct FactoryState {
    behavior: Mutex<MockBehavior>,
    calls: Mutex<Vec<RecordedCall>>,
    ice_servers: Mutex<Vec<IceServerConfig>>,
    next_session: AtomicU64,
}

/// Scriptable transport. Every session call is recorded in order.
#[derive(Clone)]
pub struct MockTransportFactory {
    state: Arc<FactoryState>,
}

impl MockTransportFactory {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            state: Arc::new(FactoryState {
                behavior: Mutex::new(behavior),
                calls: Mutex::new(Vec::new()),
                ice_servers: Mutex::new(Vec::new()),
                next_session: AtomicU64::new(1),
            }),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    fn behavior(&self) -> MockBehavior {
        *self.state.behavior.lock().unwrap()
    }

    fn record(&self, peer_id: ParticipantId, session: u64, call: TransportCall) {
        self.state.calls.lock().unwrap().push(RecordedCall {
            peer_id,
            session,
            call,
        });
    }

    pub fn calls_for(&self, peer_id: &ParticipantId) -> Vec<RecordedCall> {
        self.state
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.peer_id == *peer_id)
            .cloned()
            .collect()
    }

    pub fn sessions_created(&self, peer_id: &ParticipantId) -> usize {
        self.count(peer_id, |call| *call == TransportCall::Create)
    }

    pub fn sessions_open(&self, peer_id: &ParticipantId) -> usize {
        self.sessions_created(peer_id) - self.count(peer_id, |call| *call == TransportCall::Close)
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.state.ice_servers.lock().unwrap().clone()
    }

    fn count(&self, peer_id: &ParticipantId, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls_for(peer_id)
            .iter()
            .filter(|c| pred(&c.call))
            .count()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create_session(
        &self,
        peer_id: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> anyhow::Result<Box<dyn TransportSession>> {
        if self.behavior() == MockBehavior::FailsToOpen {
            anyhow::bail!("mock transport refused to open");
        }

        let session = self.state.next_session.fetch_add(1, Ordering::SeqCst);
        self.record(peer_id, session, TransportCall::Create);

        Ok(Box::new(MockSession {
            peer_id,
            session,
            behavior: self.behavior(),
            events,
            factory: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    fn configure_ice(&self, ice_servers: &[IceServerConfig]) {
        *self.state.ice_servers.lock().unwrap() = ice_servers.to_vec();
    }
}

struct MockSession {
    peer_id: ParticipantId,
    session: u64,
    behavior: MockBehavior,
    events: mpsc::Sender<TransportEvent>,
    factory: MockTransportFactory,
    closed: AtomicBool,
}

impl MockSession {
    fn record(&self, call: TransportCall) {
        self.factory.record(self.peer_id, self.session, call);
    }

    /// Reports what happens once both descriptions are in place.
    async fn negotiated(&self) {
        match self.behavior {
            MockBehavior::Connects => {
                let audio = RemoteAudio::detached(format!("mock-{}", self.session));
                let _ = self
                    .events
                    .send(TransportEvent::RemoteMedia(self.peer_id, audio))
                    .await;
                let _ = self
                    .events
                    .send(TransportEvent::MediaFlowing(self.peer_id))
                    .await;
            }
            MockBehavior::DropsAfterNegotiation => {
                let _ = self
                    .events
                    .send(TransportEvent::Failed(
                        self.peer_id,
                        "mock connection dropped".to_string(),
                    ))
                    .await;
            }
            MockBehavior::Stalls | MockBehavior::FailsToOpen => {}
        }
    }

    async fn gather(&self) {
        let _ = self
            .events
            .send(TransportEvent::CandidateGenerated(
                self.peer_id,
                format!("candidate-{}", self.session),
            ))
            .await;
    }
}

#[async_trait]
impl TransportSession for MockSession {
    async fn add_local_audio(&self, _audio: &LocalAudio) -> anyhow::Result<()> {
        self.record(TransportCall::AddLocalAudio);
        Ok(())
    }

    async fn create_offer(&self) -> anyhow::Result<String> {
        self.record(TransportCall::CreateOffer);
        self.gather().await;
        Ok(format!("offer-{}", self.session))
    }

    async fn create_answer(&self) -> anyhow::Result<String> {
        self.record(TransportCall::CreateAnswer);
        self.gather().await;
        self.negotiated().await;
        Ok(format!("answer-{}", self.session))
    }

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> anyhow::Result<()> {
        self.record(TransportCall::SetRemote(kind, sdp));
        if kind == SdpKind::Answer {
            self.negotiated().await;
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: String) -> anyhow::Result<()> {
        self.record(TransportCall::AddCandidate(candidate));
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.record(TransportCall::Close);
        }
        Ok(())
    }
}
