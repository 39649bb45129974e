use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,                     // assigned by the store
    pub email: String,                // unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // caller-computed, never exposed in JSON
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Exact comparison against the stored hash.
    pub fn hash_matches(&self, password_hash: &str) -> bool {
        self.password_hash == password_hash
    }

    pub fn into_profile(self) -> PublicProfile {
        PublicProfile {
            email: self.email,
            name: self.name,
        }
    }
}

/// Fields supplied by the caller when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// What a successful credential check reveals about the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub email: String,
    pub name: String,
}
