//! Elasticsearch store handle and operations.

mod bulk;
mod client;
mod schema;

pub use bulk::BulkIndexer;
pub use client::{EsStore, Index};
pub use schema::create_indices;
