//! Farmer account documents.
//!
//! Identity itself is delegated to an external provider; a user document
//! only links the provider's stable subject id to a local profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier; also the store document id.
    pub user_id: String,
    /// Stable subject id issued by the external identity provider.
    pub subject_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub modified_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        subject_id: String,
        email: String,
        first_name: Option<String>,
        last_name: Option<String>,
        phone_number: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            subject_id,
            email,
            first_name,
            last_name,
            phone_number,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial update to a user profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

impl UserPatch {
    /// Build the partial document merged into the stored user.
    /// `modifiedAt` is always refreshed.
    pub fn into_partial_doc(self, now: DateTime<Utc>) -> Value {
        let mut doc = Map::new();

        if let Some(email) = self.email {
            doc.insert("email".into(), json!(email));
        }
        if let Some(first_name) = self.first_name {
            doc.insert("firstName".into(), json!(first_name));
        }
        if let Some(last_name) = self.last_name {
            doc.insert("lastName".into(), json!(last_name));
        }
        if let Some(phone_number) = self.phone_number {
            doc.insert("phoneNumber".into(), json!(phone_number));
        }

        doc.insert("modifiedAt".into(), json!(now.timestamp()));
        Value::Object(doc)
    }
}
