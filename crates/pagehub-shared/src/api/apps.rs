use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AppVisibility;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAppRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<AppVisibility>,
    /// Id of the public template app this app is forked from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_source: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAppRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<AppVisibility>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncTemplateRequest {
    #[serde(default)]
    pub overwrite_existing: bool,
}

/// Per-page outcome counts of one template sync run, plus the template
/// version the destination ended up on.
#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateSyncReport {
    pub created: u32,
    pub overwritten: u32,
    pub skipped: u32,
    pub applied_version: i32,
}
