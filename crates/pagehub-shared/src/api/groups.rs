use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Group, SubscriptionStatus};

/// Upsert-by-name save. Saving an existing (owner, name) pair bumps the
/// group's version instead of creating a duplicate.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveGroupRequest {
    pub name: String,
    pub tree: Value,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub auto_include: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A public group offered to the caller, with where they stand on it.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupOffer {
    #[serde(flatten)]
    pub group: Group,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptGroupResponse {
    pub group: Group,
    pub subscription_id: Uuid,
}
