//! Produce-category reference data, read-only to the serving path.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use paddock::error::ApiError;
use paddock::store::Index;

use crate::response;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct CategoryDoc {
    value: String,
}

#[derive(Debug, Serialize)]
struct CategoryList {
    categories: Vec<String>,
}

/// `GET /categories`
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let docs: Vec<CategoryDoc> = state
        .store
        .find_docs(Index::Categories, json!({ "match_all": {} }), 1000, None)
        .await?;

    Ok(response::ok(CategoryList {
        categories: docs.into_iter().map(|c| c.value).collect(),
    }))
}
