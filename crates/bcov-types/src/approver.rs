//! The [`Approver`] capability and the default user identity.

use serde::{Deserialize, Serialize};

/// An identity that can approve changes.
///
/// The engine only ever needs a stable username from an approver, so the
/// capability is a single accessor. Any identity type can participate by
/// implementing it; no inheritance hierarchy is implied.
pub trait Approver: Send + Sync {
    /// Stable organization-wide username of this approver.
    fn org_username(&self) -> &str;
}

/// A plain user identity as delivered by the role provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Organization-wide username.
    #[serde(rename = "orgUsername")]
    pub org_username: String,
}

impl User {
    /// Create a user from a username.
    pub fn new(org_username: impl Into<String>) -> Self {
        Self {
            org_username: org_username.into(),
        }
    }
}

impl Approver for User {
    fn org_username(&self) -> &str {
        &self.org_username
    }
}
