use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use pagehub_shared::tree;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::AppState;

/// What the renderer collaborator consumes: a normalized tree with the
/// owner's variables already substituted in.
#[derive(Debug, serde::Serialize)]
pub struct PublicPageResponse {
    pub username: String,
    pub slug: String,
    pub tree: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// GET /u/:username
pub async fn profile_home(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicPageResponse>, AppError> {
    serve_page(&state, &username, pagehub_shared::HOME_SEGMENT).await
}

/// GET /u/:username/*slug
pub async fn page(
    State(state): State<AppState>,
    Path((username, slug)): Path<(String, String)>,
) -> Result<Json<PublicPageResponse>, AppError> {
    serve_page(&state, &username, &slug).await
}

/// The public read path. Only published content is served, never a draft,
/// and a slug nobody has built yet comes back as the empty
/// normalized root so the visit renders cleanly. Substitution happens on
/// every read against the owner's current variables.
async fn serve_page(
    state: &AppState,
    username: &str,
    slug: &str,
) -> Result<Json<PublicPageResponse>, AppError> {
    let owner: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&state.db)
        .await?;

    let (owner_id,) = owner.ok_or(AppError::NotFound)?;

    let row: Option<(Value, Option<DateTime<Utc>>)> = sqlx::query_as(
        r#"
        SELECT tree, published_at
        FROM documents
        WHERE owner_id = $1 AND slug = $2 AND status = 'published'
        "#,
    )
    .bind(owner_id)
    .bind(slug)
    .fetch_optional(&state.db)
    .await?;

    let (raw_tree, published_at) = match row {
        Some((value, published_at)) => (tree::normalize(&value), published_at),
        None => (tree::empty_root(), None),
    };

    let vars: Vec<(String, String)> =
        sqlx::query_as("SELECT key, value FROM variables WHERE user_id = $1")
            .bind(owner_id)
            .fetch_all(&state.db)
            .await?;

    let vars: HashMap<String, String> = vars.into_iter().collect();
    let rendered = tree::substitute(&raw_tree, &vars);

    Ok(Json(PublicPageResponse {
        username: username.to_string(),
        slug: slug.to_string(),
        tree: rendered,
        published_at,
    }))
}
