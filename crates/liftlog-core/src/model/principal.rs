use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// The authenticated identity making a request
///
/// Produced by an external principal resolver from a bearer credential.
/// The access control service only ever looks at `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
}

impl Principal {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}
