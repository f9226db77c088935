//! Geocoded address directory records.
//!
//! Populated out-of-band by the ingest binary from cleaned G-NAF exports;
//! read-only to the serving path.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// One gazetteer entry: a geocoded street within a locality.
///
/// `locality` and `street` are stored upper-cased to match the normalization
/// applied to farm addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub locality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    pub postcode: String,
    #[serde(default)]
    pub postcode_int: Option<i64>,
    pub state: String,
    pub point: GeoPoint,
}
