//! Query planning: select one of the three search paths and compose the
//! pre/post filters, independent of any store's pipeline syntax.

use super::params::SearchQuery;

/// The three mutually exclusive search strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Ranked by distance from a resolved address-directory point.
    Location {
        city: Option<String>,
        zipcode: Option<String>,
        /// Folded into the address lookup, not applied as a post-filter.
        state: Option<String>,
    },
    /// Ranked by full-text relevance over the farm index.
    Text { q: String },
    /// Store order, no inherent ranking.
    Browse,
}

/// A planned search: path plus filter composition and pagination inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub path: SearchPath,
    /// Applied to text/browse results only; the location path narrows by
    /// state during address resolution instead.
    pub state_filter: Option<String>,
    /// When non-empty, results are restricted to farms owning produce in
    /// these categories (resolved to a candidate-id set before the main
    /// query runs).
    pub categories: Vec<String>,
    pub distance_km: f64,
    pub page: u32,
    pub limit: u32,
}

/// Choose the search path for a validated query.
///
/// A resolved city or zipcode always wins; free text applies only when no
/// location was resolved; otherwise the query is an unfiltered browse.
pub fn plan_search(query: &SearchQuery) -> QueryPlan {
    let has_location = query.city.is_some() || query.zipcode.is_some();

    let (path, state_filter) = if has_location {
        (
            SearchPath::Location {
                city: query.city.clone(),
                zipcode: query.zipcode.clone(),
                state: query.state.clone(),
            },
            None,
        )
    } else if let Some(q) = &query.q {
        (SearchPath::Text { q: q.clone() }, query.state.clone())
    } else {
        (SearchPath::Browse, query.state.clone())
    };

    QueryPlan {
        path,
        state_filter,
        categories: query.categories.clone(),
        distance_km: query.distance_km,
        page: query.page,
        limit: query.limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_query() -> SearchQuery {
        SearchQuery {
            q: None,
            city: None,
            state: None,
            zipcode: None,
            distance_km: 50.0,
            categories: Vec::new(),
            page: 1,
            limit: 20,
        }
    }

    #[test]
    fn test_city_selects_location_path() {
        let plan = plan_search(&SearchQuery {
            city: Some("CAIRNS".into()),
            state: Some("QLD".into()),
            ..base_query()
        });
        assert_eq!(
            plan.path,
            SearchPath::Location {
                city: Some("CAIRNS".into()),
                zipcode: None,
                state: Some("QLD".into()),
            }
        );
        // State folds into the address lookup, never the post-filter.
        assert_eq!(plan.state_filter, None);
    }

    #[test]
    fn test_zipcode_selects_location_path_over_text() {
        let plan = plan_search(&SearchQuery {
            q: Some("mango".into()),
            zipcode: Some("4870".into()),
            ..base_query()
        });
        assert!(matches!(plan.path, SearchPath::Location { .. }));
    }

    #[test]
    fn test_text_path_with_state_filter() {
        let plan = plan_search(&SearchQuery {
            q: Some("organic honey".into()),
            state: Some("QLD".into()),
            ..base_query()
        });
        assert_eq!(
            plan.path,
            SearchPath::Text {
                q: "organic honey".into()
            }
        );
        assert_eq!(plan.state_filter.as_deref(), Some("QLD"));
    }

    #[test]
    fn test_browse_path() {
        let plan = plan_search(&base_query());
        assert_eq!(plan.path, SearchPath::Browse);
        assert_eq!(plan.state_filter, None);
    }

    #[test]
    fn test_state_alone_is_browse_with_filter() {
        let plan = plan_search(&SearchQuery {
            state: Some("NSW".into()),
            ..base_query()
        });
        assert_eq!(plan.path, SearchPath::Browse);
        assert_eq!(plan.state_filter.as_deref(), Some("NSW"));
    }
}
