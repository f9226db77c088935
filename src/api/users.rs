//! Farmer account handlers. Registration is driven by the identity
//! provider; the remaining operations act on the caller's own profile.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use paddock::error::ApiError;
use paddock::models::{User, UserPatch};
use paddock::store::Index;

use crate::response;
use crate::auth::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    /// Stable subject id issued by the identity provider.
    pub subject_id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// `POST /auth/register` — called by the identity provider on sign-up.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_email_unused(&state, &payload.email).await?;

    let user = User::new(
        payload.subject_id,
        payload.email,
        payload.first_name,
        payload.last_name,
        payload.phone_number,
    );
    state.store.insert(Index::Users, &user.user_id, &user).await?;
    info!(user_id = %user.user_id, subject = %user.subject_id, "farmer registered");

    Ok(response::created("Farmer registered successfully", user))
}

/// `GET /auth/profile`
pub async fn profile(auth: AuthUser) -> Result<impl IntoResponse, ApiError> {
    Ok(response::ok(auth.user))
}

/// `POST /auth/update`
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(patch): Json<UserPatch>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(email) = &patch.email {
        if *email != auth.user.email {
            ensure_email_unused(&state, email).await?;
        }
    }

    let partial = patch.into_partial_doc(Utc::now());
    state
        .store
        .update_fields(Index::Users, &auth.user.user_id, partial)
        .await?;

    let user: User = state
        .store
        .get(Index::Users, &auth.user.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user disappeared during update")))?;

    Ok(response::ok_message("Farmer updated successfully", user))
}

/// `POST /auth/delete`
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete(Index::Users, &auth.user.user_id).await?;
    info!(user_id = %auth.user.user_id, "farmer deleted");

    Ok(response::message("Farmer deleted successfully"))
}

async fn ensure_email_unused(state: &AppState, email: &str) -> Result<(), ApiError> {
    let existing: Option<User> = state
        .store
        .find_one(Index::Users, json!({ "term": { "email": email } }))
        .await?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(format!(
            "Email is already registered, {}",
            email
        )));
    }
    Ok(())
}
