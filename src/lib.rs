//! Paddock - a farmer/produce marketplace directory backed by Elasticsearch
//!
//! This library provides shared types and modules for the api and ingest binaries.

pub mod error;
pub mod models;
pub mod search;
pub mod store;

pub use models::{AddressRecord, Farm, FarmAddress, GeoPoint, Produce, User};
