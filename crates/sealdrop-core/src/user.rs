//! User profiles and the registry that maps identities to them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Identity;

/// Public profile of an identity.
///
/// The public key is what other users wrap content keys for. Sealdrop never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "first_name")]
    pub first_name: String,
    #[serde(rename = "last_name")]
    pub last_name: String,
    #[serde(rename = "public_key")]
    pub public_key: Vec<u8>,
}

impl User {
    /// Create a profile.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        public_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            public_key: public_key.into(),
        }
    }
}

/// Identity -> profile. Profiles are upserted, never removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserRegistry {
    users: BTreeMap<Identity, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the profile of `identity`.
    ///
    /// Returns the previous profile, if any.
    pub fn set(&mut self, identity: Identity, user: User) -> Option<User> {
        self.users.insert(identity, user)
    }

    pub fn get(&self, identity: &Identity) -> Option<&User> {
        self.users.get(identity)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.users.contains_key(identity)
    }

    /// All profiles, in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &User)> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
