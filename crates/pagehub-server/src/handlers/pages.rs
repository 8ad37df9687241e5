use std::sync::OnceLock;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pagehub_shared::{
    api::{PageSummary, PublishPageRequest, SavePageRequest},
    tree, Document, DocumentStatus,
};
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

type DocumentRow = (
    Uuid,                  // id
    Uuid,                  // owner_id
    String,                // slug
    DocumentStatus,        // status
    Value,                 // tree
    Option<DateTime<Utc>>, // published_at
    DateTime<Utc>,         // updated_at
);

fn row_to_document(row: DocumentRow) -> Document {
    Document {
        id: row.0,
        owner_id: row.1,
        slug: row.2,
        status: row.3,
        tree: row.4,
        published_at: row.5,
        updated_at: row.6,
    }
}

/// Path-like page address: lowercase segments separated by single slashes.
fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_-]*(/[a-z0-9][a-z0-9_-]*)*$").expect("slug pattern is valid")
    })
}

fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 200 || !slug_pattern().is_match(slug) {
        return Err(AppError::Validation(format!("Invalid page slug: {slug}")));
    }
    Ok(())
}

/// Bump the version counter of the template app (if any) whose slug prefix
/// covers a just-republished page, so forks know a newer page set exists.
pub async fn bump_template_version(
    conn: &mut sqlx::PgConnection,
    owner_id: Uuid,
    slug: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE apps
        SET template_version = template_version + 1, updated_at = NOW()
        WHERE owner_id = $1
          AND is_template = TRUE
          AND ($2 = slug OR $2 LIKE slug || '/%')
        "#,
    )
    .bind(owner_id)
    .bind(slug)
    .execute(conn)
    .await?;

    Ok(())
}

/// GET /api/v1/pages
pub async fn list_pages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<PageSummary>>, AppError> {
    let rows: Vec<(String, DocumentStatus, Option<DateTime<Utc>>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT slug, status, published_at, updated_at
        FROM documents
        WHERE owner_id = $1
        ORDER BY slug
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    let pages = rows
        .into_iter()
        .map(|(slug, status, published_at, updated_at)| PageSummary {
            slug,
            status,
            published_at,
            updated_at,
        })
        .collect();

    Ok(Json(pages))
}

/// GET /api/v1/pages/*slug
pub async fn get_page(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Json<Document>, AppError> {
    let row: DocumentRow = sqlx::query_as(
        r#"
        SELECT id, owner_id, slug, status, tree, published_at, updated_at
        FROM documents
        WHERE owner_id = $1 AND slug = $2
        "#,
    )
    .bind(user.id)
    .bind(&slug)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(row_to_document(row)))
}

/// PUT /api/v1/pages/*slug
///
/// Upsert-by-slug editor save. The tree is normalized before it is stored;
/// the page keeps its current status unless the save asks for one, and an
/// explicit `published` is a full publish transition.
pub async fn save_page(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    Json(req): Json<SavePageRequest>,
) -> Result<Json<Document>, AppError> {
    validate_slug(&slug)?;

    let tree = tree::normalize(&req.tree);
    let now = Utc::now();

    let existing: Option<(Uuid, DocumentStatus)> =
        sqlx::query_as("SELECT id, status FROM documents WHERE owner_id = $1 AND slug = $2")
            .bind(user.id)
            .bind(&slug)
            .fetch_optional(&state.db)
            .await?;

    let publishing = req.status == Some(DocumentStatus::Published);

    let mut tx = state.db.begin().await?;

    let row: DocumentRow = match existing {
        None => {
            let status = req.status.unwrap_or(DocumentStatus::Draft);
            let published_at = publishing.then_some(now);

            sqlx::query_as(
                r#"
                INSERT INTO documents (id, owner_id, slug, status, tree, published_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, owner_id, slug, status, tree, published_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(&slug)
            .bind(status)
            .bind(&tree)
            .bind(published_at)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?
        }
        Some((id, current_status)) => {
            let status = req.status.unwrap_or(current_status);

            sqlx::query_as(
                r#"
                UPDATE documents
                SET tree = $1,
                    status = $2,
                    published_at = CASE WHEN $3 THEN $4 ELSE published_at END,
                    updated_at = $4
                WHERE id = $5
                RETURNING id, owner_id, slug, status, tree, published_at, updated_at
                "#,
            )
            .bind(&tree)
            .bind(status)
            .bind(publishing)
            .bind(now)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        }
    };

    if publishing {
        bump_template_version(&mut *tx, user.id, &slug).await?;
    }

    tx.commit().await?;

    Ok(Json(row_to_document(row)))
}

/// POST /api/v1/publish
pub async fn publish_page(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PublishPageRequest>,
) -> Result<Json<Document>, AppError> {
    let now = Utc::now();

    let mut tx = state.db.begin().await?;

    let row: Option<DocumentRow> = sqlx::query_as(
        r#"
        UPDATE documents
        SET status = 'published', published_at = $1, updated_at = $1
        WHERE owner_id = $2 AND slug = $3
        RETURNING id, owner_id, slug, status, tree, published_at, updated_at
        "#,
    )
    .bind(now)
    .bind(user.id)
    .bind(&req.slug)
    .fetch_optional(&mut *tx)
    .await?;

    let row = row.ok_or(AppError::NotFound)?;

    bump_template_version(&mut *tx, user.id, &req.slug).await?;

    tx.commit().await?;

    Ok(Json(row_to_document(row)))
}

/// DELETE /api/v1/pages/*slug
pub async fn delete_page(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM documents WHERE owner_id = $1 AND slug = $2")
        .bind(user.id)
        .bind(&slug)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_accepts_nested_paths() {
        assert!(validate_slug("home").is_ok());
        assert!(validate_slug("shop/home").is_ok());
        assert!(validate_slug("shop/summer-sale/faq").is_ok());
    }

    #[test]
    fn slug_rejects_malformed_paths() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("/leading").is_err());
        assert!(validate_slug("trailing/").is_err());
        assert!(validate_slug("double//slash").is_err());
        assert!(validate_slug("Upper").is_err());
        assert!(validate_slug("sp ace").is_err());
        assert!(validate_slug(&"x".repeat(201)).is_err());
    }
}
