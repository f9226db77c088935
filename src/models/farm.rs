//! Farm profile documents indexed into the farm store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Farm street address.
///
/// The fields used for matching (street, city, state) are stored upper-cased
/// so equality against the address directory is case-insensitive. The postal
/// code is kept both as the original string and as a parsed integer
/// (`zip_code_int` is `None` when the string is not numeric).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub zip_code_int: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<GeoPoint>,
}

impl FarmAddress {
    /// Upper-case the matching fields and re-derive the parsed postal code.
    pub fn normalize(&mut self) {
        for field in [&mut self.street, &mut self.city, &mut self.state] {
            if let Some(value) = field {
                *value = value.trim().to_uppercase();
            }
        }
        self.zip_code_int = self
            .zip_code
            .as_deref()
            .and_then(|z| z.trim().parse::<i64>().ok());
    }
}

/// Per-farm usage counters, bumped by the track-view/track-contact endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmMetrics {
    #[serde(default)]
    pub profile_views: u64,
    #[serde(default)]
    pub contact_clicks: u64,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_viewed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_contacted_at: Option<DateTime<Utc>>,
}

/// Farm profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    /// Unique identifier; also the store document id.
    pub farm_id: String,
    /// Internal id of the owning user.
    pub owner_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub address: FarmAddress,
    #[serde(default)]
    pub metrics: FarmMetrics,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub modified_at: DateTime<Utc>,
}

impl Farm {
    /// Create a new farm owned by `owner_id`, normalizing its address.
    pub fn new(
        owner_id: &str,
        name: String,
        description: Option<String>,
        opening_hours: Option<String>,
        mut address: FarmAddress,
    ) -> Self {
        address.normalize();
        let now = Utc::now();
        Self {
            farm_id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name,
            description,
            opening_hours,
            address,
            metrics: FarmMetrics::default(),
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial update to a farm's address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmAddressPatch {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub point: Option<GeoPoint>,
}

/// Partial update to a farm, as supplied by `PUT /farms/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub opening_hours: Option<String>,
    pub address: Option<FarmAddressPatch>,
}

impl FarmPatch {
    /// Build the partial document merged into the stored farm.
    ///
    /// Only supplied fields appear. Address sub-fields are special-cased:
    /// street/city/state are upper-cased and a supplied zip code re-derives
    /// `zipCodeInt` (explicitly null when unparsable, so a stale integer
    /// never survives the merge). `modifiedAt` is always refreshed.
    pub fn into_partial_doc(self, now: DateTime<Utc>) -> Value {
        let mut doc = Map::new();

        if let Some(name) = self.name {
            doc.insert("name".into(), json!(name));
        }
        if let Some(description) = self.description {
            doc.insert("description".into(), json!(description));
        }
        if let Some(opening_hours) = self.opening_hours {
            doc.insert("openingHours".into(), json!(opening_hours));
        }

        if let Some(address) = self.address {
            let mut addr = Map::new();
            if let Some(street) = address.street {
                addr.insert("street".into(), json!(street.trim().to_uppercase()));
            }
            if let Some(city) = address.city {
                addr.insert("city".into(), json!(city.trim().to_uppercase()));
            }
            if let Some(state) = address.state {
                addr.insert("state".into(), json!(state.trim().to_uppercase()));
            }
            if let Some(zip_code) = address.zip_code {
                let zip_int = zip_code.trim().parse::<i64>().ok();
                addr.insert("zipCode".into(), json!(zip_code));
                addr.insert("zipCodeInt".into(), json!(zip_int));
            }
            if let Some(point) = address.point {
                addr.insert("point".into(), json!(point));
            }
            doc.insert("address".into(), Value::Object(addr));
        }

        doc.insert("modifiedAt".into(), json!(now.timestamp()));
        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalize_uppercases_matching_fields() {
        let mut address = FarmAddress {
            street: Some("12 Sheridan St".into()),
            city: Some("Cairns".into()),
            state: Some("qld".into()),
            zip_code: Some("4870".into()),
            zip_code_int: None,
            point: None,
        };
        address.normalize();

        assert_eq!(address.street.as_deref(), Some("12 SHERIDAN ST"));
        assert_eq!(address.city.as_deref(), Some("CAIRNS"));
        assert_eq!(address.state.as_deref(), Some("QLD"));
        assert_eq!(address.zip_code.as_deref(), Some("4870"));
        assert_eq!(address.zip_code_int, Some(4870));
    }

    #[test]
    fn test_address_normalize_unparsable_zip() {
        let mut address = FarmAddress {
            zip_code: Some("48-70".into()),
            zip_code_int: Some(4870),
            ..Default::default()
        };
        address.normalize();
        assert_eq!(address.zip_code.as_deref(), Some("48-70"));
        assert_eq!(address.zip_code_int, None);
    }

    #[test]
    fn test_patch_includes_only_supplied_fields() {
        let patch = FarmPatch {
            name: Some("New Name".into()),
            ..Default::default()
        };
        let doc = patch.into_partial_doc(Utc::now());

        assert_eq!(doc["name"], json!("New Name"));
        assert!(doc.get("description").is_none());
        assert!(doc.get("address").is_none());
        assert!(doc.get("modifiedAt").is_some());
    }

    #[test]
    fn test_patch_rederives_zip_code_int() {
        let patch = FarmPatch {
            address: Some(FarmAddressPatch {
                zip_code: Some("4870".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let doc = patch.into_partial_doc(Utc::now());
        assert_eq!(doc["address"]["zipCodeInt"], json!(4870));
    }

    #[test]
    fn test_patch_non_numeric_zip_nulls_int_keeps_string() {
        let patch = FarmPatch {
            address: Some(FarmAddressPatch {
                zip_code: Some("postal 12".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let doc = patch.into_partial_doc(Utc::now());
        assert_eq!(doc["address"]["zipCode"], json!("postal 12"));
        assert_eq!(doc["address"]["zipCodeInt"], Value::Null);
    }

    #[test]
    fn test_patch_uppercases_address_subfields() {
        let patch = FarmPatch {
            address: Some(FarmAddressPatch {
                city: Some("Mareeba".into()),
                state: Some("qld".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let doc = patch.into_partial_doc(Utc::now());
        assert_eq!(doc["address"]["city"], json!("MAREEBA"));
        assert_eq!(doc["address"]["state"], json!("QLD"));
        assert!(doc["address"].get("street").is_none());
    }
}
