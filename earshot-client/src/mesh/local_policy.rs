use earshot_core::{NearbySet, ParticipantId};
use std::collections::BTreeSet;

/// Per-participant mute and block lists. Never shared with the coordinator.
///
/// The two sets are independent: muting only silences a peer, blocking keeps
/// the peer out of the connection table entirely.
#[derive(Debug, Default, Clone)]
pub struct LocalPolicy {
    muted: BTreeSet<ParticipantId>,
    blocked: BTreeSet<ParticipantId>,
}

impl LocalPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the peer was not muted before.
    pub fn mute(&mut self, id: ParticipantId) -> bool {
        self.muted.insert(id)
    }

    pub fn unmute(&mut self, id: &ParticipantId) -> bool {
        self.muted.remove(id)
    }

    pub fn is_muted(&self, id: &ParticipantId) -> bool {
        self.muted.contains(id)
    }

    /// Returns `true` if the peer was not blocked before.
    pub fn block(&mut self, id: ParticipantId) -> bool {
        self.blocked.insert(id)
    }

    pub fn unblock(&mut self, id: &ParticipantId) -> bool {
        self.blocked.remove(id)
    }

    pub fn is_blocked(&self, id: &ParticipantId) -> bool {
        self.blocked.contains(id)
    }

    pub fn muted(&self) -> &BTreeSet<ParticipantId> {
        &self.muted
    }

    pub fn blocked(&self) -> &BTreeSet<ParticipantId> {
        &self.blocked
    }

    /// The nearby set with blocked peers removed.
    pub fn filter_nearby(&self, nearby: &NearbySet) -> NearbySet {
        nearby
            .iter()
            .filter(|user| !self.is_blocked(&user.id))
            .collect()
    }
}
