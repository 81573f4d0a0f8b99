use crate::mesh::local_policy::LocalPolicy;
use earshot_core::{NearbySet, ParticipantId};
use std::collections::BTreeSet;

/// Difference between the peers the local participant should be connected to
/// and the peers it currently holds entries for.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_connect: Vec<ParticipantId>,
    pub to_disconnect: Vec<ParticipantId>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_connect.is_empty() && self.to_disconnect.is_empty()
    }
}

/// `to_connect` is every eligible nearby peer without an entry,
/// `to_disconnect` every entry whose peer is no longer eligible. Eligible
/// means nearby, not blocked, and not the local participant.
pub fn reconcile<'a>(
    local_id: ParticipantId,
    nearby: &NearbySet,
    policy: &LocalPolicy,
    current: impl IntoIterator<Item = &'a ParticipantId>,
) -> ReconcilePlan {
    let eligible: BTreeSet<ParticipantId> = policy
        .filter_nearby(nearby)
        .iter()
        .map(|user| user.id)
        .filter(|id| *id != local_id)
        .collect();
    let current: BTreeSet<ParticipantId> = current.into_iter().copied().collect();

    ReconcilePlan {
        to_connect: eligible.difference(&current).copied().collect(),
        to_disconnect: current.difference(&eligible).copied().collect(),
    }
}
