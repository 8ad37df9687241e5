use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A reusable, clonable named subtree. `owner_id = None` marks a global
/// catalog entry not owned by any user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub tree: Value,
    pub public: bool,
    pub auto_include: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_group_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "subscription_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Accepted,
    Declined,
}

/// One user's relationship to one public group. If accepted, points at the
/// private clone the acceptance produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloned_group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
