use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Leaf segment reserved for an app's landing page, e.g. `myapp/home`.
pub const HOME_SEGMENT: &str = "home";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "document_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Published,
}

impl DocumentStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// One slug-addressed page-builder page. `tree` is the opaque nested
/// document payload; see [`crate::tree`] for its shape contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub slug: String,
    pub status: DocumentStatus,
    pub tree: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical slug of an app's landing page.
pub fn home_slug(app_slug: &str) -> String {
    format!("{}/{}", app_slug, HOME_SEGMENT)
}

/// Whether `slug` addresses a page belonging to the app at `app_slug`,
/// including the bare legacy landing page.
pub fn slug_under_app(slug: &str, app_slug: &str) -> bool {
    slug == app_slug || slug.starts_with(&format!("{}/", app_slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_slug_appends_reserved_segment() {
        assert_eq!(home_slug("shop"), "shop/home");
    }

    #[test]
    fn slug_under_app_matches_bare_and_nested() {
        assert!(slug_under_app("shop", "shop"));
        assert!(slug_under_app("shop/home", "shop"));
        assert!(slug_under_app("shop/contact", "shop"));
        assert!(!slug_under_app("shopping/home", "shop"));
        assert!(!slug_under_app("other", "shop"));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Published).unwrap(),
            "\"published\""
        );
        assert!(DocumentStatus::Published.is_published());
        assert!(!DocumentStatus::Draft.is_published());
    }
}
