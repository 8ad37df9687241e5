use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "app_visibility", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AppVisibility {
    Public,
    Private,
}

/// A named container of documents under a shared slug prefix. Template apps
/// (`is_template` + public) expose their full page set for syncing into
/// other users' apps; `template_source` on the destination records where a
/// forked app came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_template: bool,
    pub visibility: AppVisibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_source: Option<Uuid>,
    pub template_version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_template_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl App {
    /// A template app's pages can be synced by other users only when it is
    /// both flagged as a template and publicly visible.
    pub fn is_public_template(&self) -> bool {
        self.is_template && self.visibility == AppVisibility::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(is_template: bool, visibility: AppVisibility) -> App {
        App {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Demo".to_string(),
            slug: "demo".to_string(),
            is_template,
            visibility,
            template_source: None,
            template_version: 1,
            last_template_sync_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn public_template_requires_both_flags() {
        assert!(app(true, AppVisibility::Public).is_public_template());
        assert!(!app(true, AppVisibility::Private).is_public_template());
        assert!(!app(false, AppVisibility::Public).is_public_template());
    }
}
