//! Search execution against the store.
//!
//! Drives the planned query: category pre-filter, one of the three search
//! paths, post-filters, produce join, and pagination.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::models::{AddressRecord, Farm, Produce};
use crate::store::{EsStore, Index};

use super::pagination::Pagination;
use super::params::SearchQuery;
use super::plan::{plan_search, QueryPlan, SearchPath};
use super::rank::{rank_farms, AddressCandidate};

/// Upper bound on address-directory candidates examined per radius query.
const MAX_ADDRESS_CANDIDATES: usize = 200;
/// Upper bound on farms pulled into the in-memory ranking step.
const MAX_FARM_CANDIDATES: usize = 1000;
/// Upper bound on produce rows examined for the category pre-filter.
const MAX_CATEGORY_PRODUCE: usize = 10000;

/// One farm in a search result page.
#[derive(Debug, Serialize)]
pub struct FarmSearchResult {
    #[serde(flatten)]
    pub farm: Farm,
    /// Distance in meters from the resolved search center; present on the
    /// location path only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    pub produce: Vec<Produce>,
}

/// A served page of farms plus pagination metadata.
#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub farms: Vec<FarmSearchResult>,
    pub pagination: Pagination,
}

/// Execute a validated farm search end to end.
pub async fn execute_search(store: &EsStore, query: SearchQuery) -> Result<SearchPage, ApiError> {
    let plan = plan_search(&query);
    debug!(?plan, "executing farm search");

    // Category pre-filter: resolve the requested categories to the set of
    // farm ids owning matching produce. An empty set short-circuits to an
    // empty page.
    let candidate_ids = match farm_ids_in_categories(store, &plan.categories).await? {
        Some(ids) if ids.is_empty() => {
            return Ok(empty_page(plan.page, plan.limit));
        }
        other => other,
    };

    match &plan.path {
        SearchPath::Location {
            city,
            zipcode,
            state,
        } => {
            execute_location_path(
                store,
                &plan,
                city.as_deref(),
                zipcode.as_deref(),
                state.as_deref(),
                candidate_ids.as_ref(),
            )
            .await
        }
        SearchPath::Text { q } => {
            let main_clause = json!({
                "multi_match": {
                    "query": q,
                    "fields": [
                        "name^3",
                        "description",
                        "openingHours",
                        "address.street.text",
                        "address.city.text",
                        "address.state"
                    ]
                }
            });
            execute_query_path(store, &plan, main_clause, candidate_ids.as_ref()).await
        }
        SearchPath::Browse => {
            let main_clause = json!({ "match_all": {} });
            execute_query_path(store, &plan, main_clause, candidate_ids.as_ref()).await
        }
    }
}

fn empty_page(page: u32, limit: u32) -> SearchPage {
    SearchPage {
        farms: Vec::new(),
        pagination: Pagination::compute(page, limit, 0),
    }
}

/// Distinct farm ids owning produce in any of the requested categories.
/// `None` means no category filter was requested.
pub async fn farm_ids_in_categories(
    store: &EsStore,
    categories: &[String],
) -> Result<Option<HashSet<String>>, ApiError> {
    if categories.is_empty() {
        return Ok(None);
    }

    let produce: Vec<Produce> = store
        .find_docs(
            Index::Produce,
            json!({ "terms": { "category": categories } }),
            MAX_CATEGORY_PRODUCE,
            None,
        )
        .await?;

    Ok(Some(produce.into_iter().map(|p| p.farm_id).collect()))
}

/// Path A: resolve a center point, radius-query the address directory, and
/// rank matching farms by distance.
async fn execute_location_path(
    store: &EsStore,
    plan: &QueryPlan,
    city: Option<&str>,
    zipcode: Option<&str>,
    state: Option<&str>,
    candidate_ids: Option<&HashSet<String>>,
) -> Result<SearchPage, ApiError> {
    // Resolve the human-supplied location to a single directory record.
    let mut must = Vec::new();
    if let Some(city) = city {
        must.push(json!({ "term": { "locality": city } }));
    }
    if let Some(zipcode) = zipcode {
        must.push(json!({ "term": { "postcode": zipcode } }));
    }
    if let Some(state) = state {
        must.push(json!({ "term": { "state": state } }));
    }

    let center: Option<AddressRecord> = store
        .find_one(Index::Addresses, json!({ "bool": { "must": must } }))
        .await?;

    // An unknown location is an empty result set, not an error.
    let Some(center) = center else {
        debug!(?city, ?zipcode, "no address record for location");
        return Ok(empty_page(plan.page, plan.limit));
    };

    // Radius query, ascending distance in meters.
    let body = json!({
        "query": {
            "bool": {
                "filter": [{
                    "geo_distance": {
                        "distance": format!("{}km", plan.distance_km),
                        "point": { "lat": center.point.lat, "lon": center.point.lon }
                    }
                }]
            }
        },
        "sort": [{
            "_geo_distance": {
                "point": { "lat": center.point.lat, "lon": center.point.lon },
                "order": "asc",
                "unit": "m"
            }
        }],
        "size": MAX_ADDRESS_CANDIDATES
    });

    let response = store.search(Index::Addresses, body).await?;
    let addresses = parse_address_candidates(&response);

    if addresses.is_empty() {
        return Ok(empty_page(plan.page, plan.limit));
    }

    // Pull farm candidates matching the nearby localities or postcodes in
    // one query, then apply the ranking contract in memory.
    let cities: Vec<&str> = dedup(addresses.iter().map(|a| a.locality.as_str()));
    let zips: Vec<i64> = {
        let mut seen = HashSet::new();
        addresses
            .iter()
            .filter_map(|a| a.postcode_int)
            .filter(|z| seen.insert(*z))
            .collect()
    };

    let farm_query = json!({
        "bool": {
            "should": [
                {
                    "bool": {
                        "must": [
                            { "terms": { "address.city": cities } },
                            { "term": { "address.state": center.state } }
                        ]
                    }
                },
                { "terms": { "address.zipCodeInt": zips } }
            ],
            "minimum_should_match": 1
        }
    });

    let mut farms: Vec<Farm> = store
        .find_docs(Index::Farms, farm_query, MAX_FARM_CANDIDATES, None)
        .await?;

    if let Some(ids) = candidate_ids {
        farms.retain(|f| ids.contains(&f.farm_id));
    }

    let ranked = rank_farms(&addresses, &farms);

    let pagination = Pagination::compute(plan.page, plan.limit, ranked.len() as u64);
    let offset = pagination.offset() as usize;
    let page: Vec<_> = ranked
        .into_iter()
        .skip(offset)
        .take(plan.limit as usize)
        .collect();

    let mut produce_by_farm =
        fetch_produce(store, page.iter().map(|r| r.farm.farm_id.clone()).collect()).await?;

    let farms = page
        .into_iter()
        .map(|ranked| {
            let produce = produce_by_farm
                .remove(&ranked.farm.farm_id)
                .unwrap_or_default();
            FarmSearchResult {
                farm: ranked.farm,
                distance_m: Some(ranked.distance_m),
                produce,
            }
        })
        .collect();

    Ok(SearchPage { farms, pagination })
}

/// Paths B and C: a single farm-index query with post-filters folded in.
/// The total comes from a parallel count over the same predicate, not the
/// paginated slice.
async fn execute_query_path(
    store: &EsStore,
    plan: &QueryPlan,
    main_clause: Value,
    candidate_ids: Option<&HashSet<String>>,
) -> Result<SearchPage, ApiError> {
    let mut filter = Vec::new();
    if let Some(ids) = candidate_ids {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        filter.push(json!({ "ids": { "values": ids } }));
    }
    if let Some(state) = &plan.state_filter {
        filter.push(json!({ "term": { "address.state": state } }));
    }

    let query = json!({
        "bool": {
            "must": [main_clause],
            "filter": filter
        }
    });

    let total_items = store.count(Index::Farms, query.clone()).await?;
    let pagination = Pagination::compute(plan.page, plan.limit, total_items);

    let farms: Vec<Farm> = store
        .find_docs(
            Index::Farms,
            query,
            plan.limit as usize,
            Some(pagination.offset()),
        )
        .await?;

    let mut produce_by_farm =
        fetch_produce(store, farms.iter().map(|f| f.farm_id.clone()).collect()).await?;

    let farms = farms
        .into_iter()
        .map(|farm| {
            let produce = produce_by_farm.remove(&farm.farm_id).unwrap_or_default();
            FarmSearchResult {
                farm,
                distance_m: None,
                produce,
            }
        })
        .collect();

    Ok(SearchPage { farms, pagination })
}

/// Join the served page's farms to their produce lists.
async fn fetch_produce(
    store: &EsStore,
    farm_ids: Vec<String>,
) -> Result<HashMap<String, Vec<Produce>>, ApiError> {
    if farm_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let produce: Vec<Produce> = store
        .find_docs(
            Index::Produce,
            json!({ "terms": { "farmId": farm_ids } }),
            MAX_CATEGORY_PRODUCE,
            None,
        )
        .await?;

    let mut by_farm: HashMap<String, Vec<Produce>> = HashMap::new();
    for item in produce {
        by_farm.entry(item.farm_id.clone()).or_default().push(item);
    }
    Ok(by_farm)
}

fn parse_address_candidates(response: &Value) -> Vec<AddressCandidate> {
    response["hits"]["hits"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| {
                    let record: AddressRecord =
                        serde_json::from_value(hit["_source"].clone()).ok()?;
                    let distance_m = hit["sort"].as_array()?.first()?.as_f64()?;
                    Some(AddressCandidate {
                        street: record.street,
                        locality: record.locality,
                        state: record.state,
                        postcode_int: record.postcode_int,
                        distance_m,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn dedup<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}
