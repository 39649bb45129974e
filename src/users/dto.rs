use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::NewUser;

/// Request body for user creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

impl From<CreateUserRequest> for NewUser {
    fn from(r: CreateUserRequest) -> Self {
        Self {
            email: r.email,
            password_hash: r.password_hash,
            name: r.name,
        }
    }
}

/// Response returned after a user is created.
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub id: Uuid,
}

/// Request body for a credential check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCredentialsRequest {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}
