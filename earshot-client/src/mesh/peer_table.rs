use crate::error::MeshError;
use crate::negotiation::PeerTaskHandle;
use earshot_core::ParticipantId;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    Idle,
    Offering,
    AnsweringPending,
    Connected,
    Closing,
}

impl PeerState {
    pub fn can_transition_to(self, next: PeerState) -> bool {
        use PeerState::*;

        matches!(
            (self, next),
            (Idle, Offering)
                | (Idle, AnsweringPending)
                | (Offering, AnsweringPending)
                | (AnsweringPending, Connected)
                | (Idle | Offering | AnsweringPending | Connected, Closing)
        )
    }
}

/// Which side of the offer/answer exchange the local participant plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Answerer,
}

pub struct PeerEntry {
    pub peer_id: ParticipantId,
    pub state: PeerState,
    pub role: Role,
    pub attempt: u64,
    pub task: Option<PeerTaskHandle>,
    pub audio_attached: bool,
}

impl PeerEntry {
    pub fn new(peer_id: ParticipantId, role: Role, attempt: u64) -> Self {
        Self {
            peer_id,
            state: PeerState::Idle,
            role,
            attempt,
            task: None,
            audio_attached: false,
        }
    }
}

/// Connection entries keyed by remote participant. Holds at most one entry
/// per peer and only lets entries move along legal state transitions.
#[derive(Default)]
pub struct PeerConnectionTable {
    entries: HashMap<ParticipantId, PeerEntry>,
}

impl PeerConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: PeerEntry) -> Result<&mut PeerEntry, MeshError> {
        let peer_id = entry.peer_id;
        if self.entries.contains_key(&peer_id) {
            return Err(MeshError::DuplicatePeer(peer_id));
        }
        Ok(self.entries.entry(peer_id).or_insert(entry))
    }

    pub fn get(&self, peer_id: &ParticipantId) -> Option<&PeerEntry> {
        self.entries.get(peer_id)
    }

    pub fn get_mut(&mut self, peer_id: &ParticipantId) -> Option<&mut PeerEntry> {
        self.entries.get_mut(peer_id)
    }

    pub fn contains(&self, peer_id: &ParticipantId) -> bool {
        self.entries.contains_key(peer_id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParticipantId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remove(&mut self, peer_id: &ParticipantId) -> Option<PeerEntry> {
        self.entries.remove(peer_id)
    }

    pub fn transition(
        &mut self,
        peer_id: &ParticipantId,
        next: PeerState,
    ) -> Result<(), MeshError> {
        let entry = self
            .entries
            .get_mut(peer_id)
            .ok_or(MeshError::UnknownPeer(*peer_id))?;

        if !entry.state.can_transition_to(next) {
            return Err(MeshError::InvalidTransition {
                peer_id: *peer_id,
                from: entry.state,
                to: next,
            });
        }

        debug!("Peer {}: {:?} -> {:?}", peer_id, entry.state, next);
        entry.state = next;
        Ok(())
    }
}
