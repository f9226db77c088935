//! JSON response envelope shared by every handler.
//!
//! Success responses are `{"success": true, "message"?, "data"?}`; error
//! responses are produced by `ApiError`'s `IntoResponse` impl.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 200 with data.
pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: None,
            data: Some(data),
        }),
    )
}

/// 200 with a human-readable message and data.
pub fn ok_message<T: Serialize>(
    message: &'static str,
    data: T,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: Some(message),
            data: Some(data),
        }),
    )
}

/// 201 with a human-readable message and the created resource.
pub fn created<T: Serialize>(
    message: &'static str,
    data: T,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            message: Some(message),
            data: Some(data),
        }),
    )
}

/// 200 with a message only (deletes, metric bumps).
pub fn message(message: &'static str) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: Some(message),
            data: None,
        }),
    )
}
