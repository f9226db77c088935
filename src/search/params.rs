//! Query parameter validation for the farm search endpoint.

use serde::Deserialize;

use crate::error::ApiError;

/// Recognized state abbreviations for location-token classification.
pub const STATE_ABBREVIATIONS: &[&str] = &["NSW", "VIC", "QLD", "WA", "SA", "TAS", "ACT", "NT"];

/// Default search radius in kilometers.
pub const DEFAULT_DISTANCE_KM: f64 = 50.0;

/// Raw query-string fields as received on `GET /farms`.
///
/// Numeric fields arrive as strings so malformed values become a typed
/// BadRequest instead of a framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub distance: Option<String>,
    pub categories: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Validated search query with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub distance_km: f64,
    pub categories: Vec<String>,
    /// Requested page, floor-clamped to 1. The upper clamp happens once
    /// totals are known.
    pub page: u32,
    /// Items per page, clamped into [1, 100].
    pub limit: u32,
}

impl SearchQuery {
    pub fn from_raw(raw: RawSearchParams) -> Result<Self, ApiError> {
        let page = parse_page(raw.page.as_deref())?;
        let limit = parse_limit(raw.limit.as_deref())?;

        let distance_km = match raw.distance.as_deref() {
            Some(value) => {
                let parsed = value.trim().parse::<f64>().map_err(|_| {
                    ApiError::BadRequest(format!("Invalid distance parameter, {}", value))
                })?;
                // NaN, infinities, and non-positive radii all parse as f64
                // but make no sense as a search radius.
                if !parsed.is_finite() || parsed <= 0.0 {
                    return Err(ApiError::BadRequest(format!(
                        "Invalid distance parameter, {}",
                        value
                    )));
                }
                parsed
            }
            None => DEFAULT_DISTANCE_KM,
        };

        let categories = parse_categories(raw.categories.as_deref());

        // A combined location string is authoritative: when present, the
        // explicit city/state/zipcode parameters are ignored entirely.
        let (city, state, zipcode) = match raw.location.as_deref() {
            Some(location) => parse_location(location),
            None => (
                raw.city.map(|c| c.trim().to_uppercase()),
                raw.state.map(|s| s.trim().to_uppercase()),
                raw.zipcode.map(|z| z.trim().to_string()),
            ),
        };

        Ok(Self {
            q: raw.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            city,
            state,
            zipcode,
            distance_km,
            categories,
            page,
            limit,
        })
    }
}

/// Parse a page parameter, defaulting to 1 and floor-clamping to 1.
/// Values past `u32::MAX` saturate so the upper clamp against the real page
/// count still lands on the last page.
pub fn parse_page(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw {
        Some(value) => {
            let page = value
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid page parameter, {}", value)))?;
            Ok(page.clamp(1, i64::from(u32::MAX)) as u32)
        }
        None => Ok(1),
    }
}

/// Parse a limit parameter, defaulting to 20 and clamping into [1, 100].
pub fn parse_limit(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw {
        Some(value) => {
            let limit = value
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid limit parameter, {}", value)))?;
            Ok(limit.clamp(1, 100) as u32)
        }
        None => Ok(20),
    }
}

/// Split a comma-separated categories parameter, dropping empty tokens.
pub fn parse_categories(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Split a combined location string into (city, state, zipcode).
///
/// Each comma-separated token, trimmed and upper-cased: a known state
/// abbreviation sets the state; exactly four ASCII digits set the zipcode;
/// anything else is taken as the city.
fn parse_location(location: &str) -> (Option<String>, Option<String>, Option<String>) {
    let mut city = None;
    let mut state = None;
    let mut zipcode = None;

    for token in location.split(',') {
        let token = token.trim().to_uppercase();
        if token.is_empty() {
            continue;
        }

        if STATE_ABBREVIATIONS.contains(&token.as_str()) {
            state = Some(token);
        } else if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
            zipcode = Some(token);
        } else {
            city = Some(token);
        }
    }

    (city, state, zipcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: RawSearchParams) -> SearchQuery {
        SearchQuery::from_raw(raw).expect("valid params")
    }

    #[test]
    fn test_defaults() {
        let q = query(RawSearchParams::default());
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 20);
        assert_eq!(q.distance_km, DEFAULT_DISTANCE_KM);
        assert!(q.categories.is_empty());
        assert_eq!(q.city, None);
    }

    #[test]
    fn test_location_postcode_and_state() {
        let q = query(RawSearchParams {
            location: Some("4870,QLD".into()),
            ..Default::default()
        });
        assert_eq!(q.zipcode.as_deref(), Some("4870"));
        assert_eq!(q.state.as_deref(), Some("QLD"));
        assert_eq!(q.city, None);
    }

    #[test]
    fn test_location_city_and_state() {
        let q = query(RawSearchParams {
            location: Some("Cairns, qld".into()),
            ..Default::default()
        });
        assert_eq!(q.city.as_deref(), Some("CAIRNS"));
        assert_eq!(q.state.as_deref(), Some("QLD"));
        assert_eq!(q.zipcode, None);
    }

    #[test]
    fn test_location_overrides_explicit_params() {
        let q = query(RawSearchParams {
            location: Some("Mareeba".into()),
            city: Some("Brisbane".into()),
            state: Some("NSW".into()),
            zipcode: Some("2000".into()),
            ..Default::default()
        });
        assert_eq!(q.city.as_deref(), Some("MAREEBA"));
        assert_eq!(q.state, None);
        assert_eq!(q.zipcode, None);
    }

    #[test]
    fn test_explicit_params_uppercased() {
        let q = query(RawSearchParams {
            city: Some("Atherton".into()),
            state: Some("qld".into()),
            ..Default::default()
        });
        assert_eq!(q.city.as_deref(), Some("ATHERTON"));
        assert_eq!(q.state.as_deref(), Some("QLD"));
    }

    #[test]
    fn test_five_digit_token_is_city_not_zipcode() {
        // Australian postcodes are four digits; anything else falls through.
        let q = query(RawSearchParams {
            location: Some("48701".into()),
            ..Default::default()
        });
        assert_eq!(q.city.as_deref(), Some("48701"));
        assert_eq!(q.zipcode, None);
    }

    #[test]
    fn test_limit_clamped() {
        let q = query(RawSearchParams {
            limit: Some("500".into()),
            ..Default::default()
        });
        assert_eq!(q.limit, 100);

        let q = query(RawSearchParams {
            limit: Some("0".into()),
            ..Default::default()
        });
        assert_eq!(q.limit, 1);

        let q = query(RawSearchParams {
            limit: Some("-3".into()),
            ..Default::default()
        });
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn test_page_beyond_u32_saturates() {
        use super::super::pagination::Pagination;

        let page = parse_page(Some("4294967297")).expect("valid page");
        assert_eq!(page, u32::MAX);

        // The saturated page still clamps down to the real last page.
        let p = Pagination::compute(page, 20, 50);
        assert_eq!(p.current_page, 3);
    }

    #[test]
    fn test_malformed_page_rejected() {
        let err = SearchQuery::from_raw(RawSearchParams {
            page: Some("two".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_malformed_limit_rejected() {
        let err = SearchQuery::from_raw(RawSearchParams {
            limit: Some("lots".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_malformed_distance_rejected() {
        let err = SearchQuery::from_raw(RawSearchParams {
            distance: Some("near".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_non_finite_and_non_positive_distance_rejected() {
        for bad in ["NaN", "inf", "-inf", "-5", "0"] {
            let err = SearchQuery::from_raw(RawSearchParams {
                distance: Some(bad.into()),
                ..Default::default()
            })
            .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "accepted {}", bad);
        }
    }

    #[test]
    fn test_categories_split_and_trimmed() {
        let q = query(RawSearchParams {
            categories: Some("Fruit, Vegetable,,honey ".into()),
            ..Default::default()
        });
        assert_eq!(q.categories, vec!["Fruit", "Vegetable", "honey"]);
    }
}
