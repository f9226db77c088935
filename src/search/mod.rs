//! Farm search composition.
//!
//! A raw query string is validated into a [`SearchQuery`], planned into one
//! of three mutually exclusive paths (location-ranked, text-ranked, or
//! unranked browse) by [`plan_search`], and executed against the store by
//! [`execute_search`]. The location path's ranking contract lives in
//! [`rank_farms`], which is pure and store-independent.

mod execute;
mod pagination;
mod params;
mod plan;
mod rank;

pub use execute::{execute_search, farm_ids_in_categories, FarmSearchResult, SearchPage};
pub use pagination::Pagination;
pub use params::{
    parse_categories, parse_limit, parse_page, RawSearchParams, SearchQuery, STATE_ABBREVIATIONS,
};
pub use plan::{plan_search, QueryPlan, SearchPath};
pub use rank::{rank_farms, AddressCandidate, RankedFarm};
