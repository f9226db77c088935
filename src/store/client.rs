//! Elasticsearch store wrapper.
//!
//! One `EsStore` handle is constructed at process start and injected into
//! request handlers; no module-level client exists. All operations are
//! single-document or single-query; the store itself is the only shared
//! mutable state in the system.

use anyhow::{Context, Result};
use elasticsearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    params::Refresh,
    CountParts, DeleteByQueryParts, DeleteParts, Elasticsearch, GetParts, IndexParts, SearchParts,
    UpdateParts,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

/// Logical collections, mapped to prefixed Elasticsearch indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    Farms,
    Produce,
    Addresses,
    Categories,
    Users,
}

impl Index {
    pub const ALL: [Index; 5] = [
        Index::Farms,
        Index::Produce,
        Index::Addresses,
        Index::Categories,
        Index::Users,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Index::Farms => "farms",
            Index::Produce => "produce",
            Index::Addresses => "addresses",
            Index::Categories => "categories",
            Index::Users => "users",
        }
    }
}

/// Elasticsearch client wrapper with index naming.
#[derive(Clone)]
pub struct EsStore {
    client: Elasticsearch,
    prefix: String,
}

impl EsStore {
    /// Create a new store handle.
    pub fn new(es_url: &str, prefix: &str) -> Result<Self> {
        let url = Url::parse(es_url)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool).disable_proxy().build()?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            prefix: prefix.to_string(),
        })
    }

    /// Get the underlying Elasticsearch client
    pub fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Full index name for a logical collection.
    pub fn index_name(&self, index: Index) -> String {
        format!("{}-{}", self.prefix, index.suffix())
    }

    /// Check if cluster is healthy
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await?;

        Ok(response.status_code().is_success())
    }

    /// Get document count in an index
    pub async fn doc_count(&self, index: Index) -> Result<u64> {
        let name = self.index_name(index);
        let response = self
            .client
            .count(CountParts::Index(&[&name]))
            .send()
            .await?;

        let body = response.json::<Value>().await?;
        Ok(body["count"].as_u64().unwrap_or(0))
    }

    /// Fetch a document by id. Returns `None` when it does not exist.
    pub async fn get<T: DeserializeOwned>(&self, index: Index, id: &str) -> Result<Option<T>> {
        let name = self.index_name(index);
        let response = self
            .client
            .get(GetParts::IndexId(&name, id))
            .send()
            .await
            .context("Get request failed")?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }

        let body = response.json::<Value>().await?;
        if !body["found"].as_bool().unwrap_or(false) {
            return Ok(None);
        }

        let doc = serde_json::from_value(body["_source"].clone())
            .context("Failed to deserialize document")?;
        Ok(Some(doc))
    }

    /// Insert (or overwrite) a document, visible to subsequent searches.
    pub async fn insert<T: Serialize>(&self, index: Index, id: &str, doc: &T) -> Result<()> {
        let name = self.index_name(index);
        let response = self
            .client
            .index(IndexParts::IndexId(&name, id))
            .body(serde_json::to_value(doc)?)
            .refresh(Refresh::WaitFor)
            .send()
            .await
            .context("Index request failed")?;

        if !response.status_code().is_success() {
            let error_body = response.text().await?;
            anyhow::bail!("Failed to index document: {}", error_body);
        }
        Ok(())
    }

    /// Merge a partial document into an existing one.
    /// Returns false when the document does not exist.
    pub async fn update_fields(&self, index: Index, id: &str, partial: Value) -> Result<bool> {
        let name = self.index_name(index);
        let response = self
            .client
            .update(UpdateParts::IndexId(&name, id))
            .body(json!({ "doc": partial }))
            .refresh(Refresh::WaitFor)
            .send()
            .await
            .context("Update request failed")?;

        if response.status_code().as_u16() == 404 {
            return Ok(false);
        }
        if !response.status_code().is_success() {
            let error_body = response.text().await?;
            anyhow::bail!("Failed to update document: {}", error_body);
        }
        Ok(true)
    }

    /// Run a scripted update against a single document (atomic per-document).
    /// Returns false when the document does not exist.
    pub async fn scripted_update(&self, index: Index, id: &str, script: Value) -> Result<bool> {
        let name = self.index_name(index);
        let response = self
            .client
            .update(UpdateParts::IndexId(&name, id))
            .body(json!({ "script": script }))
            .refresh(Refresh::WaitFor)
            .send()
            .await
            .context("Scripted update request failed")?;

        if response.status_code().as_u16() == 404 {
            return Ok(false);
        }
        if !response.status_code().is_success() {
            let error_body = response.text().await?;
            anyhow::bail!("Failed to run scripted update: {}", error_body);
        }
        Ok(true)
    }

    /// Delete a document by id. Returns false when it did not exist.
    pub async fn delete(&self, index: Index, id: &str) -> Result<bool> {
        let name = self.index_name(index);
        let response = self
            .client
            .delete(DeleteParts::IndexId(&name, id))
            .refresh(Refresh::WaitFor)
            .send()
            .await
            .context("Delete request failed")?;

        Ok(response.status_code().as_u16() != 404)
    }

    /// Delete every document matching a query. Returns the deleted count.
    pub async fn delete_by_query(&self, index: Index, query: Value) -> Result<u64> {
        let name = self.index_name(index);
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[&name]))
            .body(json!({ "query": query }))
            .refresh(true)
            .send()
            .await
            .context("Delete-by-query request failed")?;

        let body = response.json::<Value>().await?;
        Ok(body["deleted"].as_u64().unwrap_or(0))
    }

    /// Count documents matching a query.
    pub async fn count(&self, index: Index, query: Value) -> Result<u64> {
        let name = self.index_name(index);
        let response = self
            .client
            .count(CountParts::Index(&[&name]))
            .body(json!({ "query": query }))
            .send()
            .await
            .context("Count request failed")?;

        let body = response.json::<Value>().await?;
        Ok(body["count"].as_u64().unwrap_or(0))
    }

    /// Execute a raw search body and return the response JSON.
    pub async fn search(&self, index: Index, body: Value) -> Result<Value> {
        let name = self.index_name(index);
        let response = self
            .client
            .search(SearchParts::Index(&[&name]))
            .body(body)
            .send()
            .await
            .context("Search request failed")?;

        if !response.status_code().is_success() {
            let error_body = response.text().await?;
            anyhow::bail!("Search failed: {}", error_body);
        }

        Ok(response.json::<Value>().await?)
    }

    /// Fetch the `_source` of every hit for a query, up to `size` documents.
    pub async fn find_docs<T: DeserializeOwned>(
        &self,
        index: Index,
        query: Value,
        size: usize,
        from: Option<u64>,
    ) -> Result<Vec<T>> {
        let mut body = json!({ "query": query, "size": size });
        if let Some(from) = from {
            body["from"] = json!(from);
        }

        let response = self.search(index, body).await?;
        Ok(parse_sources(&response))
    }

    /// Fetch the single best hit for a query, if any.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        index: Index,
        query: Value,
    ) -> Result<Option<T>> {
        let mut docs = self.find_docs(index, query, 1, None).await?;
        Ok(docs.pop())
    }
}

/// Deserialize the `_source` of every hit, skipping malformed documents.
pub(crate) fn parse_sources<T: DeserializeOwned>(response: &Value) -> Vec<T> {
    response["hits"]["hits"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| serde_json::from_value(hit["_source"].clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
