use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NearbyUser {
    pub id: ParticipantId,
    pub username: String,
}

/// Participants within range of some other participant. Order is irrelevant;
/// entries are keyed by id so equality ignores the order they were produced in.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "Vec<NearbyUser>", into = "Vec<NearbyUser>")]
pub struct NearbySet {
    users: BTreeMap<ParticipantId, String>,
}

impl NearbySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: NearbyUser) {
        self.users.insert(user.id, user.username);
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.users.contains_key(id)
    }

    pub fn username(&self, id: &ParticipantId) -> Option<&str> {
        self.users.get(id).map(String::as_str)
    }

    pub fn ids(&self) -> HashSet<ParticipantId> {
        self.users.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NearbyUser> + '_ {
        self.users.iter().map(|(id, username)| NearbyUser {
            id: *id,
            username: username.clone(),
        })
    }
}

impl FromIterator<NearbyUser> for NearbySet {
    fn from_iter<I: IntoIterator<Item = NearbyUser>>(iter: I) -> Self {
        let mut set = NearbySet::new();
        for user in iter {
            set.insert(user);
        }
        set
    }
}

impl From<Vec<NearbyUser>> for NearbySet {
    fn from(users: Vec<NearbyUser>) -> Self {
        users.into_iter().collect()
    }
}

impl From<NearbySet> for Vec<NearbyUser> {
    fn from(set: NearbySet) -> Self {
        set.iter().collect()
    }
}
