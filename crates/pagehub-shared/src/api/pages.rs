use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::DocumentStatus;

/// Body of the upsert-by-slug save. Omitting `status` keeps the page in its
/// current state; an explicit `published` is a publish transition.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavePageRequest {
    pub tree: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishPageRequest {
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageSummary {
    pub slug: String,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
