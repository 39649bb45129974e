use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    state::AppState,
    storage::UserStoreError,
    users::{
        dto::{CreateUserRequest, CreatedUserResponse, EmailQuery, VerifyCredentialsRequest},
        repo_types::{PublicProfile, User},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/by-email", get(find_user_by_email))
        .route("/users/verify", post(verify_credentials))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    let users = state.users.list_users().await.map_err(store_error)?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn find_user_by_email(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<Option<User>>, (StatusCode, String)> {
    let user = state
        .users
        .find_user_by_email(&q.email)
        .await
        .map_err(store_error)?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), (StatusCode, String)> {
    let email = payload.email.clone();
    let id = state
        .users
        .create_user(payload.into())
        .await
        .map_err(store_error)?;

    info!(user_id = %id, email = %email, "user created");
    Ok((StatusCode::CREATED, Json(CreatedUserResponse { id })))
}

#[instrument(skip(state, payload))]
pub async fn verify_credentials(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCredentialsRequest>,
) -> Result<Json<Option<PublicProfile>>, (StatusCode, String)> {
    let profile = state
        .users
        .verify_credentials(&payload.email, &payload.password_hash)
        .await
        .map_err(store_error)?;

    if profile.is_none() {
        warn!(email = %payload.email, "credentials rejected");
    }
    Ok(Json(profile))
}

fn store_error(e: UserStoreError) -> (StatusCode, String) {
    match e {
        UserStoreError::DuplicateEmail(email) => {
            warn!(email = %email, "email already registered");
            (StatusCode::CONFLICT, "User already exists".into())
        }
        UserStoreError::Database(e) => {
            error!(error = %e, "user store failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
