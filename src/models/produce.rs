//! Produce item documents, each owned by a farm.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A sellable item tagged with a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Produce {
    /// Unique identifier; also the store document id.
    pub produce_id: String,
    /// Owning farm. Every produce record references an existing farm at
    /// creation time, and deleting a farm deletes its produce.
    pub farm_id: String,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub modified_at: DateTime<Utc>,
}

impl Produce {
    pub fn new(
        farm_id: &str,
        name: String,
        category: String,
        price: Option<f64>,
        unit: Option<String>,
        availability: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            produce_id: uuid::Uuid::new_v4().to_string(),
            farm_id: farm_id.to_string(),
            name,
            category,
            price,
            unit,
            availability,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial update to a produce item, as supplied by `PUT /produce/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducePatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub unit: Option<String>,
    pub availability: Option<String>,
}

impl ProducePatch {
    /// Build the partial document merged into the stored produce item.
    /// `modifiedAt` is always refreshed.
    pub fn into_partial_doc(self, now: DateTime<Utc>) -> Value {
        let mut doc = Map::new();

        if let Some(name) = self.name {
            doc.insert("name".into(), json!(name));
        }
        if let Some(category) = self.category {
            doc.insert("category".into(), json!(category));
        }
        if let Some(price) = self.price {
            doc.insert("price".into(), json!(price));
        }
        if let Some(unit) = self.unit {
            doc.insert("unit".into(), json!(unit));
        }
        if let Some(availability) = self.availability {
            doc.insert("availability".into(), json!(availability));
        }

        doc.insert("modifiedAt".into(), json!(now.timestamp()));
        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_partial_fields_only() {
        let patch = ProducePatch {
            price: Some(12.5),
            availability: Some("Limited".into()),
            ..Default::default()
        };
        let doc = patch.into_partial_doc(Utc::now());

        assert_eq!(doc["price"], json!(12.5));
        assert_eq!(doc["availability"], json!("Limited"));
        assert!(doc.get("name").is_none());
        assert!(doc.get("category").is_none());
        assert!(doc.get("modifiedAt").is_some());
    }
}
