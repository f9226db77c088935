//! Farm CRUD, search, and usage-metric handlers.

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
use paddock::models::{Farm, FarmAddress, FarmPatch, Produce, User};
use paddock::search::{
    execute_search, farm_ids_in_categories, parse_categories, parse_limit, parse_page, Pagination,
    RawSearchParams, SearchQuery,
};
use paddock::store::Index;

use crate::response;
use crate::auth::AuthUser;
use crate::AppState;

/// A farm with its produce list attached.
#[derive(Debug, Serialize)]
pub struct FarmView {
    #[serde(flatten)]
    pub farm: Farm,
    pub produce: Vec<Produce>,
}

/// `GET /farms` — the search composer.
pub async fn search_farms(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = SearchQuery::from_raw(raw)?;
    let page = execute_search(&state.store, query).await?;
    Ok(response::ok(page))
}

/// `GET /farms/{farmId}`
pub async fn get_farm(
    State(state): State<Arc<AppState>>,
    Path(farm_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut farm = fetch_farm(&state, &farm_id).await?;
    map_owner_to_subject(&state, &mut farm).await?;

    let produce: Vec<Produce> = state
        .store
        .find_docs(
            Index::Produce,
            json!({ "term": { "farmId": farm_id } }),
            1000,
            None,
        )
        .await?;

    Ok(response::ok(FarmView { farm, produce }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub address: FarmAddress,
}

/// `POST /farms`
pub async fn create_farm(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(payload): Json<FarmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut farm = Farm::new(
        &auth.user.user_id,
        payload.name,
        payload.description,
        payload.opening_hours,
        payload.address,
    );
    state.store.insert(Index::Farms, &farm.farm_id, &farm).await?;
    info!(farm_id = %farm.farm_id, owner = %auth.user.user_id, "farm registered");

    // The caller knows their external identity, not our internal id.
    farm.owner_id = auth.subject_id;
    Ok(response::created("Farm registered successfully", farm))
}

/// `PUT /farms/{farmId}`
pub async fn update_farm(
    State(state): State<Arc<AppState>>,
    Path(farm_id): Path<String>,
    auth: AuthUser,
    Json(patch): Json<FarmPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let farm = fetch_farm(&state, &farm_id).await?;
    require_owner(&auth, &farm)?;

    let partial = patch.into_partial_doc(Utc::now());
    state
        .store
        .update_fields(Index::Farms, &farm_id, partial)
        .await?;

    let mut farm = fetch_farm(&state, &farm_id).await?;
    map_owner_to_subject(&state, &mut farm).await?;
    Ok(response::ok_message("Farm updated successfully", farm))
}

/// `DELETE /farms/{farmId}` — cascades to the farm's produce.
pub async fn delete_farm(
    State(state): State<Arc<AppState>>,
    Path(farm_id): Path<String>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let farm = fetch_farm(&state, &farm_id).await?;
    require_owner(&auth, &farm)?;

    state.store.delete(Index::Farms, &farm_id).await?;
    let orphaned = state
        .store
        .delete_by_query(Index::Produce, json!({ "term": { "farmId": farm_id } }))
        .await?;
    info!(farm_id = %farm_id, produce_deleted = orphaned, "farm deleted");

    Ok(response::message("Farm deleted successfully"))
}

#[derive(Debug, Default, Deserialize)]
pub struct MyFarmsParams {
    pub city: Option<String>,
    pub state: Option<String>,
    pub categories: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// `GET /my_farms` — the caller's own farms, with optional filtering.
pub async fn my_farms(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<MyFarmsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = parse_page(params.page.as_deref())?;
    let limit = parse_limit(params.limit.as_deref())?;
    let categories = parse_categories(params.categories.as_deref());

    let candidate_ids = farm_ids_in_categories(&state.store, &categories).await?;
    if let Some(ids) = &candidate_ids {
        if ids.is_empty() {
            return Ok(response::ok(json!({
                "farms": [],
                "pagination": Pagination::compute(page, limit, 0),
            })));
        }
    }

    let mut filter = owned_farms_filter(
        &auth.user.user_id,
        params.city.as_deref(),
        params.state.as_deref(),
    );
    if let Some(ids) = &candidate_ids {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        filter.push(json!({ "ids": { "values": ids } }));
    }
    let query = json!({ "bool": { "filter": filter } });

    let total_items = state.store.count(Index::Farms, query.clone()).await?;
    let pagination = Pagination::compute(page, limit, total_items);

    let farms: Vec<Farm> = state
        .store
        .find_docs(
            Index::Farms,
            query,
            limit as usize,
            Some(pagination.offset()),
        )
        .await?;

    // Every listed farm belongs to the caller, so the external subject id
    // stands in for the internal owner id, matching the single-farm views.
    let farms: Vec<Farm> = farms
        .into_iter()
        .map(|mut farm| {
            farm.owner_id = auth.subject_id.clone();
            farm
        })
        .collect();

    Ok(response::ok(json!({
        "farms": farms,
        "pagination": pagination,
    })))
}

/// Owner-scoped filter clauses with optional location narrowing.
fn owned_farms_filter(
    owner_id: &str,
    city: Option<&str>,
    state: Option<&str>,
) -> Vec<serde_json::Value> {
    let mut filter = vec![json!({ "term": { "ownerId": owner_id } })];
    if let Some(city) = city {
        filter.push(json!({ "term": { "address.city": city.trim().to_uppercase() } }));
    }
    if let Some(state) = state {
        filter.push(json!({ "term": { "address.state": state.trim().to_uppercase() } }));
    }
    filter
}

/// `POST /farms/{farmId}/track-view`
pub async fn track_view(
    State(state): State<Arc<AppState>>,
    Path(farm_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    bump_metric(&state, &farm_id, "profileViews", "lastViewedAt").await?;
    Ok(response::message("View recorded"))
}

/// `POST /farms/{farmId}/track-contact`
pub async fn track_contact(
    State(state): State<Arc<AppState>>,
    Path(farm_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    bump_metric(&state, &farm_id, "contactClicks", "lastContactedAt").await?;
    Ok(response::message("Contact recorded"))
}

/// Atomic per-document counter bump with timestamp refresh.
async fn bump_metric(
    state: &AppState,
    farm_id: &str,
    counter: &str,
    timestamp: &str,
) -> Result<(), ApiError> {
    let script = json!({
        "source": format!(
            "ctx._source.metrics.{counter} += 1; ctx._source.metrics.{timestamp} = params.now;"
        ),
        "lang": "painless",
        "params": { "now": Utc::now().timestamp() }
    });

    let found = state
        .store
        .scripted_update(Index::Farms, farm_id, script)
        .await?;
    if !found {
        return Err(ApiError::BadRequest(format!("Farm not found, {}", farm_id)));
    }
    Ok(())
}

pub(crate) async fn fetch_farm(state: &AppState, farm_id: &str) -> Result<Farm, ApiError> {
    state
        .store
        .get(Index::Farms, farm_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("Farm not found, {}", farm_id)))
}

pub(crate) fn require_owner(auth: &AuthUser, farm: &Farm) -> Result<(), ApiError> {
    if auth.user.user_id != farm.owner_id {
        return Err(ApiError::Unauthorized(format!(
            "User does not own farm, {}",
            auth.user.user_id
        )));
    }
    Ok(())
}

/// Replace the internal owner id with the owner's external subject id in a
/// response body.
pub(crate) async fn map_owner_to_subject(
    state: &AppState,
    farm: &mut Farm,
) -> Result<(), ApiError> {
    if let Some(owner) = state
        .store
        .get::<User>(Index::Users, &farm.owner_id)
        .await?
    {
        farm.owner_id = owner.subject_id;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_farms_filter_owner_only() {
        let filter = owned_farms_filter("user-1", None, None);
        assert_eq!(filter, vec![json!({ "term": { "ownerId": "user-1" } })]);
    }

    #[test]
    fn test_owned_farms_filter_uppercases_location() {
        let filter = owned_farms_filter("user-1", Some("Cairns "), Some("qld"));
        assert_eq!(filter.len(), 3);
        assert_eq!(filter[1], json!({ "term": { "address.city": "CAIRNS" } }));
        assert_eq!(filter[2], json!({ "term": { "address.state": "QLD" } }));
    }
}
