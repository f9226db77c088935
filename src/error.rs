//! Typed request errors, mapped to HTTP statuses once at the API boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the serving path.
///
/// Validation and ownership failures are raised locally as the typed variants
/// below; anything else (store or transport failures) is wrapped as
/// `Internal` and reported as a generic 500 without internal detail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing/invalid parameter, referenced entity not found, or duplicate
    /// unique field.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing/invalid credential, or the authenticated identity does not
    /// own the resource being mutated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Reserved; no serving path currently raises this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Any uncaught failure, including downstream store errors.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but never leaked to the
        // client.
        let details = match &self {
            Self::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                "An unexpected error occurred.".to_string()
            }
            Self::BadRequest(msg) | Self::Unauthorized(msg) | Self::Forbidden(msg) => msg.clone(),
        };

        let body = json!({
            "success": false,
            "error": {
                "code": status.as_u16().to_string(),
                "message": self.reason(),
                "details": details,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display() {
        let err = ApiError::BadRequest("Farm not found, abc".into());
        assert_eq!(err.to_string(), "Bad request: Farm not found, abc");
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let response = ApiError::Internal(anyhow::anyhow!("es timeout at 10.0.0.3")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
