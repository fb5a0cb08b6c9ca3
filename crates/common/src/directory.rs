//! The read-only registry of configured user identities.

use crate::{Result, SwitchboardError};
use serde::{Deserialize, Serialize};

/// A configured user the system can answer queries about.
///
/// Immutable once loaded; owned by the directory, only read by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable identifier, e.g. "user1".
    pub id: String,

    /// Platform username, e.g. "alice-dev".
    pub username: String,

    /// Human-readable name used in prompts, e.g. "Alice".
    pub display_name: String,
}

/// Ordered snapshot of all configured users.
///
/// Insertion order is significant: ordinal clarification answers
/// ("the first one") map positionally onto it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDirectory {
    users: Vec<UserIdentity>,
}

impl UserDirectory {
    pub fn new(users: Vec<UserIdentity>) -> Self {
        Self { users }
    }

    /// Look up a user by id, failing if the id is not configured.
    pub fn get(&self, id: &str) -> Result<&UserIdentity> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| SwitchboardError::UnknownUser(id.to_string()))
    }

    /// All users, in configuration order.
    pub fn users(&self) -> &[UserIdentity] {
        &self.users
    }

    /// Resolve a display name or username to a user id (case-insensitive).
    pub fn find_by_name_or_username(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.users
            .iter()
            .find(|u| u.display_name.to_lowercase() == lower || u.username.to_lowercase() == lower)
            .map(|u| u.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
