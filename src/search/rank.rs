//! Distance ranking for the location search path.
//!
//! Pure functions: the store supplies address candidates sorted by ascending
//! distance and a pool of farm candidates; the ranking contract lives here.

use std::collections::HashMap;

use crate::models::Farm;

/// Exact match on (street, city, state).
const PRIORITY_ADDRESS: u8 = 1;
/// Match on the parsed postal-code integer alone.
const PRIORITY_POSTCODE: u8 = 2;

/// A nearby address-directory record with its distance from the search
/// center.
#[derive(Debug, Clone)]
pub struct AddressCandidate {
    pub street: Option<String>,
    pub locality: String,
    pub state: String,
    pub postcode_int: Option<i64>,
    pub distance_m: f64,
}

/// A farm matched through the address directory.
#[derive(Debug, Clone)]
pub struct RankedFarm {
    pub farm: Farm,
    /// Distance in meters from the search center via the matched address.
    pub distance_m: f64,
    pub priority: u8,
}

/// Rank farms against a distance-sorted list of nearby addresses.
///
/// Per address, the best-matching farm is kept: an exact (street, city,
/// state) match beats a postal-code match. A farm reachable through several
/// addresses keeps its minimum distance, ties broken toward the stronger
/// match. The result is sorted by ascending distance.
pub fn rank_farms(addresses: &[AddressCandidate], farms: &[Farm]) -> Vec<RankedFarm> {
    // farm index -> (priority, distance)
    let mut best: HashMap<usize, (u8, f64)> = HashMap::new();

    for address in addresses {
        let mut address_best: Option<(usize, u8)> = None;

        for (idx, farm) in farms.iter().enumerate() {
            let Some(priority) = match_priority(address, farm) else {
                continue;
            };
            match address_best {
                Some((_, held)) if held <= priority => {}
                _ => address_best = Some((idx, priority)),
            }
        }

        let Some((idx, priority)) = address_best else {
            continue;
        };

        match best.get(&idx) {
            Some(&(held_priority, held_distance)) => {
                let closer = address.distance_m < held_distance;
                let tie_upgrade =
                    address.distance_m == held_distance && priority < held_priority;
                if closer || tie_upgrade {
                    best.insert(idx, (priority, address.distance_m));
                }
            }
            None => {
                best.insert(idx, (priority, address.distance_m));
            }
        }
    }

    let mut ranked: Vec<RankedFarm> = best
        .into_iter()
        .map(|(idx, (priority, distance_m))| RankedFarm {
            farm: farms[idx].clone(),
            distance_m,
            priority,
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then(a.priority.cmp(&b.priority))
            .then(a.farm.farm_id.cmp(&b.farm.farm_id))
    });
    ranked
}

fn match_priority(address: &AddressCandidate, farm: &Farm) -> Option<u8> {
    let farm_address = &farm.address;

    let street_match = match (&address.street, &farm_address.street) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    let city_match = farm_address.city.as_deref() == Some(address.locality.as_str());
    let state_match = farm_address.state.as_deref() == Some(address.state.as_str());

    if street_match && city_match && state_match {
        return Some(PRIORITY_ADDRESS);
    }

    match (address.postcode_int, farm_address.zip_code_int) {
        (Some(a), Some(b)) if a == b => Some(PRIORITY_POSTCODE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FarmAddress, FarmMetrics};
    use chrono::Utc;

    fn farm(id: &str, street: Option<&str>, city: &str, state: &str, zip: Option<i64>) -> Farm {
        Farm {
            farm_id: id.to_string(),
            owner_id: "owner".to_string(),
            name: format!("Farm {}", id),
            description: None,
            opening_hours: None,
            address: FarmAddress {
                street: street.map(String::from),
                city: Some(city.to_string()),
                state: Some(state.to_string()),
                zip_code: zip.map(|z| z.to_string()),
                zip_code_int: zip,
                point: None,
            },
            metrics: FarmMetrics::default(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    fn address(
        street: Option<&str>,
        locality: &str,
        state: &str,
        postcode: Option<i64>,
        distance_m: f64,
    ) -> AddressCandidate {
        AddressCandidate {
            street: street.map(String::from),
            locality: locality.to_string(),
            state: state.to_string(),
            postcode_int: postcode,
            distance_m,
        }
    }

    #[test]
    fn test_exact_address_beats_postcode_match() {
        let farms = vec![
            farm("zip-only", None, "GORDONVALE", "QLD", Some(4870)),
            farm("exact", Some("MAIN ST"), "CAIRNS", "QLD", Some(4870)),
        ];
        let addresses = vec![address(Some("MAIN ST"), "CAIRNS", "QLD", Some(4870), 120.0)];

        let ranked = rank_farms(&addresses, &farms);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].farm.farm_id, "exact");
        assert_eq!(ranked[0].priority, 1);
    }

    #[test]
    fn test_postcode_match_when_no_exact() {
        let farms = vec![farm("zip-only", None, "ELSEWHERE", "QLD", Some(4870))];
        let addresses = vec![address(Some("MAIN ST"), "CAIRNS", "QLD", Some(4870), 300.0)];

        let ranked = rank_farms(&addresses, &farms);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].priority, 2);
        assert_eq!(ranked[0].distance_m, 300.0);
    }

    #[test]
    fn test_farm_keeps_minimum_distance_across_addresses() {
        let farms = vec![farm("f1", None, "CAIRNS", "QLD", Some(4870))];
        let addresses = vec![
            address(None, "CAIRNS", "QLD", Some(4870), 100.0),
            address(None, "CAIRNS", "QLD", Some(4870), 900.0),
        ];

        let ranked = rank_farms(&addresses, &farms);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].distance_m, 100.0);
    }

    #[test]
    fn test_results_sorted_by_ascending_distance() {
        let farms = vec![
            farm("far", Some("HIGH ST"), "MAREEBA", "QLD", Some(4880)),
            farm("near", Some("LOW ST"), "CAIRNS", "QLD", Some(4870)),
        ];
        let addresses = vec![
            address(Some("LOW ST"), "CAIRNS", "QLD", Some(4870), 50.0),
            address(Some("HIGH ST"), "MAREEBA", "QLD", Some(4880), 5000.0),
        ];

        let ranked = rank_farms(&addresses, &farms);
        let ids: Vec<&str> = ranked.iter().map(|r| r.farm.farm_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[test]
    fn test_equal_distance_tie_breaks_toward_exact_match() {
        let farms = vec![farm("f1", Some("MAIN ST"), "CAIRNS", "QLD", Some(4870))];
        let addresses = vec![
            address(None, "CAIRNS", "QLD", Some(4870), 200.0),
            address(Some("MAIN ST"), "CAIRNS", "QLD", None, 200.0),
        ];

        let ranked = rank_farms(&addresses, &farms);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].priority, 1);
    }

    #[test]
    fn test_no_matches_yields_empty() {
        let farms = vec![farm("f1", None, "BRISBANE", "QLD", Some(4000))];
        let addresses = vec![address(Some("MAIN ST"), "CAIRNS", "QLD", Some(4870), 10.0)];
        assert!(rank_farms(&addresses, &farms).is_empty());
    }
}
