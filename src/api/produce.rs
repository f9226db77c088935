//! Produce CRUD handlers. Mutations require ownership of the parent farm.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use paddock::error::ApiError;
use paddock::models::{Farm, Produce, ProducePatch};
use paddock::search::{parse_limit, parse_page, Pagination};
use paddock::store::Index;

use crate::farms::{fetch_farm, require_owner};
use crate::response;
use crate::auth::AuthUser;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A paginated produce listing for one farm.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmProduceList {
    pub farm_id: String,
    pub farm_name: String,
    pub produce: Vec<Produce>,
    pub pagination: Pagination,
}

/// `GET /farms/{farmId}/produce`
pub async fn get_farm_produce(
    State(state): State<Arc<AppState>>,
    Path(farm_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let farm = fetch_farm(&state, &farm_id).await?;

    let page = parse_page(params.page.as_deref())?;
    let limit = parse_limit(params.limit.as_deref())?;

    let query = json!({ "term": { "farmId": farm_id } });
    let total_items = state.store.count(Index::Produce, query.clone()).await?;
    let pagination = Pagination::compute(page, limit, total_items);

    let produce: Vec<Produce> = state
        .store
        .find_docs(
            Index::Produce,
            query,
            limit as usize,
            Some(pagination.offset()),
        )
        .await?;

    Ok(response::ok(FarmProduceList {
        farm_id,
        farm_name: farm.name,
        produce,
        pagination,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducePayload {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
}

/// `POST /farms/{farmId}/produce`
pub async fn add_farm_produce(
    State(state): State<Arc<AppState>>,
    Path(farm_id): Path<String>,
    auth: AuthUser,
    Json(payload): Json<ProducePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let farm = fetch_farm(&state, &farm_id).await?;
    require_owner(&auth, &farm)?;

    let produce = Produce::new(
        &farm_id,
        payload.name,
        payload.category,
        payload.price,
        payload.unit,
        payload.availability,
    );
    state
        .store
        .insert(Index::Produce, &produce.produce_id, &produce)
        .await?;
    info!(produce_id = %produce.produce_id, farm_id = %farm_id, "produce added");

    Ok(response::created("Produce added successfully", produce))
}

/// A produce item with its parent farm embedded.
#[derive(Debug, Serialize)]
pub struct ProduceView {
    #[serde(flatten)]
    pub produce: Produce,
    pub farm: Farm,
}

/// `GET /produce/{produceId}`
pub async fn get_produce(
    State(state): State<Arc<AppState>>,
    Path(produce_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let produce: Produce = state
        .store
        .get(Index::Produce, &produce_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Produce with this id does not exist, {}", produce_id))
        })?;

    let farm: Farm = state
        .store
        .get(Index::Farms, &produce.farm_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Farm with this id does not exist, {}", produce.farm_id))
        })?;

    Ok(response::ok(ProduceView { produce, farm }))
}

/// `PUT /produce/{produceId}`
pub async fn update_produce(
    State(state): State<Arc<AppState>>,
    Path(produce_id): Path<String>,
    auth: AuthUser,
    Json(patch): Json<ProducePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let produce = fetch_owned_produce(&state, &auth, &produce_id).await?;

    let partial = patch.into_partial_doc(Utc::now());
    state
        .store
        .update_fields(Index::Produce, &produce.produce_id, partial)
        .await?;

    let produce: Produce = state
        .store
        .get(Index::Produce, &produce_id)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("produce disappeared during update"))
        })?;

    Ok(response::ok_message("Produce updated successfully", produce))
}

/// `DELETE /produce/{produceId}`
pub async fn delete_produce(
    State(state): State<Arc<AppState>>,
    Path(produce_id): Path<String>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let produce = fetch_owned_produce(&state, &auth, &produce_id).await?;

    state
        .store
        .delete(Index::Produce, &produce.produce_id)
        .await?;
    info!(produce_id = %produce_id, "produce deleted");

    Ok(response::message("Produce deleted successfully"))
}

/// Fetch a produce item and verify the caller owns its parent farm.
async fn fetch_owned_produce(
    state: &AppState,
    auth: &AuthUser,
    produce_id: &str,
) -> Result<Produce, ApiError> {
    let produce: Produce = state
        .store
        .get(Index::Produce, produce_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("Produce not found, {}", produce_id)))?;

    let farm: Farm = state
        .store
        .get(Index::Farms, &produce.farm_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Associated farm not found, {}", produce.farm_id))
        })?;

    if auth.user.user_id != farm.owner_id {
        return Err(ApiError::Unauthorized(format!(
            "User does not own associated farm, {}",
            auth.user.user_id
        )));
    }

    Ok(produce)
}
