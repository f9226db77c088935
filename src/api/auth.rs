//! Identity-provider verification and the authenticated-user extractor.
//!
//! Identity is delegated entirely to an external provider. The only
//! contract consumed here: given a bearer token, return a stable subject id
//! or signal an invalid/missing credential.

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use paddock::error::ApiError;
use paddock::models::User;
use paddock::store::Index;

use crate::AppState;

/// Client for the external identity provider's verification endpoint.
pub struct IdentityClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    /// Stable subject identifier for the token's holder.
    sub: String,
}

impl IdentityClient {
    pub fn new(base_url: String, secret_key: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent("paddock-api/0.1")
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    /// Verify a bearer token, returning the provider's subject id.
    pub async fn verify(&self, token: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .get(format!("{}/v1/sessions/verify", self.base_url))
            .bearer_auth(token)
            .header("x-api-key", &self.secret_key)
            .send()
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;

        let status = response.status();
        if status.is_success() {
            let claims: VerifyResponse = response
                .json()
                .await
                .map_err(|e| ApiError::Internal(e.into()))?;
            Ok(claims.sub)
        } else if status.is_client_error() {
            Err(ApiError::Unauthorized(
                "Authentication token is missing or invalid.".to_string(),
            ))
        } else {
            Err(ApiError::Internal(anyhow::anyhow!(
                "identity provider returned {}",
                status
            )))
        }
    }
}

/// Extractor that requires a verified identity with a local user profile.
///
/// The bearer token is verified against the identity provider, then the
/// subject id is resolved to the local user document. A verified subject
/// with no local profile is a BadRequest, matching the registration flow.
pub struct AuthUser {
    pub user: User,
    pub subject_id: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                ApiError::Unauthorized("Authentication token is missing or invalid.".to_string())
            })?;

        let subject_id = state.identity.verify(token).await?;

        let user: User = state
            .store
            .find_one(Index::Users, json!({ "term": { "subjectId": subject_id } }))
            .await?
            .ok_or_else(|| ApiError::BadRequest(format!("User not found, {}", subject_id)))?;

        debug!("Authenticated {} as {}", subject_id, user.user_id);

        Ok(Self { user, subject_id })
    }
}
