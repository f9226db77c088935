//! Elasticsearch index schema management.

use anyhow::{Context, Result};
use elasticsearch::indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts};
use tracing::info;

use super::{EsStore, Index};

/// Mapping JSON embedded at compile time, one file per index.
const FARMS_MAPPING: &str = include_str!("../../schema/farms_mapping.json");
const PRODUCE_MAPPING: &str = include_str!("../../schema/produce_mapping.json");
const ADDRESSES_MAPPING: &str = include_str!("../../schema/addresses_mapping.json");
const CATEGORIES_MAPPING: &str = include_str!("../../schema/categories_mapping.json");
const USERS_MAPPING: &str = include_str!("../../schema/users_mapping.json");

fn mapping_for(index: Index) -> &'static str {
    match index {
        Index::Farms => FARMS_MAPPING,
        Index::Produce => PRODUCE_MAPPING,
        Index::Addresses => ADDRESSES_MAPPING,
        Index::Categories => CATEGORIES_MAPPING,
        Index::Users => USERS_MAPPING,
    }
}

/// Create every index with its mapping.
pub async fn create_indices(store: &EsStore, delete_existing: bool) -> Result<()> {
    for index in Index::ALL {
        create_index(store, index, delete_existing).await?;
    }
    Ok(())
}

/// Create one index with its mapping.
pub async fn create_index(store: &EsStore, index: Index, delete_existing: bool) -> Result<()> {
    let es = store.client();
    let index_name = store.index_name(index);

    // Check if index exists
    let exists = es
        .indices()
        .exists(IndicesExistsParts::Index(&[&index_name]))
        .send()
        .await?
        .status_code()
        .is_success();

    if exists {
        if delete_existing {
            info!("Deleting existing index: {}", index_name);
            es.indices()
                .delete(IndicesDeleteParts::Index(&[&index_name]))
                .send()
                .await
                .context("Failed to delete existing index")?;
        } else {
            info!("Index {} already exists, skipping creation", index_name);
            return Ok(());
        }
    }

    let mapping: serde_json::Value =
        serde_json::from_str(mapping_for(index)).context("Failed to parse mapping JSON")?;

    info!("Creating index: {}", index_name);
    let response = es
        .indices()
        .create(IndicesCreateParts::Index(&index_name))
        .body(mapping)
        .send()
        .await
        .context("Failed to create index")?;

    if !response.status_code().is_success() {
        let error_body = response.text().await?;
        anyhow::bail!("Failed to create index: {}", error_body);
    }

    info!("Index {} created successfully", index_name);
    Ok(())
}
