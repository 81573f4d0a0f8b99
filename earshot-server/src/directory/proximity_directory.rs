use earshot_core::{NearbySet, NearbyUser, ParticipantId, Position};
use std::collections::HashMap;

/// Default proximity threshold, in world units.
pub const DEFAULT_MAX_DISTANCE: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub username: String,
    pub position: Position,
}

/// Authoritative position table for everyone currently in voice.
///
/// Not synchronized on its own: the coordinator owns it from a single task, so
/// a nearby computation never observes a half-applied update.
#[derive(Debug, Default)]
pub struct ProximityDirectory {
    participants: HashMap<ParticipantId, Participant>,
}

impl ProximityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a participant at the origin. Joining again under the same id
    /// replaces the username and resets the position.
    pub fn join(&mut self, id: ParticipantId, username: impl Into<String>) -> Position {
        self.participants.insert(
            id,
            Participant {
                id,
                username: username.into(),
                position: Position::ORIGIN,
            },
        );
        Position::ORIGIN
    }

    pub fn leave(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    /// Returns `false` when the participant is unknown (already left).
    pub fn update_position(&mut self, id: &ParticipantId, position: Position) -> bool {
        let Some(participant) = self.participants.get_mut(id) else {
            return false;
        };
        participant.position = position;
        true
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants.keys()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Everyone else within `max_distance` (inclusive) of `id`.
    pub fn compute_nearby(&self, id: &ParticipantId, max_distance: f64) -> NearbySet {
        let Some(origin) = self.participants.get(id) else {
            return NearbySet::new();
        };

        self.participants
            .values()
            .filter(|other| other.id != *id)
            .filter(|other| origin.position.is_within(&other.position, max_distance))
            .map(|other| NearbyUser {
                id: other.id,
                username: other.username.clone(),
            })
            .collect()
    }

    // Naive full rescan; fine for room-sized populations.
    pub fn compute_all(&self, max_distance: f64) -> HashMap<ParticipantId, NearbySet> {
        self.participants
            .keys()
            .map(|id| (*id, self.compute_nearby(id, max_distance)))
            .collect()
    }
}
