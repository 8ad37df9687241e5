use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pagehub_shared::{
    api::{CreateAppRequest, SyncTemplateRequest, TemplateSyncReport, UpdateAppRequest},
    home_slug, App, AppVisibility,
};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

type AppRow = (
    Uuid,                  // id
    Uuid,                  // owner_id
    String,                // name
    String,                // slug
    bool,                  // is_template
    AppVisibility,         // visibility
    Option<Uuid>,          // template_source
    i32,                   // template_version
    Option<DateTime<Utc>>, // last_template_sync_at
    DateTime<Utc>,         // created_at
    DateTime<Utc>,         // updated_at
);

fn row_to_app(row: AppRow) -> App {
    App {
        id: row.0,
        owner_id: row.1,
        name: row.2,
        slug: row.3,
        is_template: row.4,
        visibility: row.5,
        template_source: row.6,
        template_version: row.7,
        last_template_sync_at: row.8,
        created_at: row.9,
        updated_at: row.10,
    }
}

const APP_COLUMNS: &str = "id, owner_id, name, slug, is_template, visibility, template_source, \
                           template_version, last_template_sync_at, created_at, updated_at";

/// Generate URL-friendly slug from name
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Map one template page onto the destination app's slug space. The page at
/// the template's own slug, or at its `/home`, becomes the destination's
/// home page; every other page keeps its path relative to the template.
fn map_target_slug(source_slug: &str, dest_slug: &str, page_slug: &str) -> String {
    if page_slug == source_slug || page_slug == home_slug(source_slug) {
        home_slug(dest_slug)
    } else if let Some(rel) = page_slug.strip_prefix(&format!("{}/", source_slug)) {
        format!("{}/{}", dest_slug, rel)
    } else {
        format!("{}/{}", dest_slug, page_slug)
    }
}

async fn find_app(state: &AppState, app_id: Uuid, owner_id: Uuid) -> Result<App, AppError> {
    let row: Option<AppRow> = sqlx::query_as(&format!(
        "SELECT {APP_COLUMNS} FROM apps WHERE id = $1 AND owner_id = $2"
    ))
    .bind(app_id)
    .bind(owner_id)
    .fetch_optional(&state.db)
    .await?;

    row.map(row_to_app).ok_or(AppError::NotFound)
}

/// POST /api/v1/apps
pub async fn create_app(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateAppRequest>,
) -> Result<Json<App>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("App name is required".to_string()));
    }

    let slug = match &req.slug {
        Some(slug) => slug.clone(),
        None => slugify(&req.name),
    };
    if slug.is_empty() || slug.contains('/') {
        return Err(AppError::Validation(
            "App slug must be a single non-empty path segment".to_string(),
        ));
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM apps WHERE owner_id = $1 AND slug = $2")
            .bind(user.id)
            .bind(&slug)
            .fetch_optional(&state.db)
            .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "An app with this slug already exists".to_string(),
        ));
    }

    let row: AppRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO apps (id, owner_id, name, slug, is_template, visibility, template_source)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {APP_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&req.name)
    .bind(&slug)
    .bind(req.is_template)
    .bind(req.visibility.unwrap_or(AppVisibility::Private))
    .bind(req.template_source)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row_to_app(row)))
}

/// GET /api/v1/apps
pub async fn list_apps(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<App>>, AppError> {
    let rows: Vec<AppRow> = sqlx::query_as(&format!(
        "SELECT {APP_COLUMNS} FROM apps WHERE owner_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(row_to_app).collect()))
}

/// GET /api/v1/apps/:id
pub async fn get_app(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<App>, AppError> {
    Ok(Json(find_app(&state, app_id, user.id).await?))
}

/// PATCH /api/v1/apps/:id
pub async fn update_app(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(app_id): Path<Uuid>,
    Json(req): Json<UpdateAppRequest>,
) -> Result<Json<App>, AppError> {
    find_app(&state, app_id, user.id).await?;

    let row: AppRow = sqlx::query_as(&format!(
        r#"
        UPDATE apps
        SET name = COALESCE($1, name),
            is_template = COALESCE($2, is_template),
            visibility = COALESCE($3, visibility),
            updated_at = NOW()
        WHERE id = $4
        RETURNING {APP_COLUMNS}
        "#
    ))
    .bind(&req.name)
    .bind(req.is_template)
    .bind(req.visibility)
    .bind(app_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row_to_app(row)))
}

/// DELETE /api/v1/apps/:id
///
/// Removes the app and every page under its slug prefix, bare legacy home
/// included, as one unit: a failure anywhere leaves everything in place.
pub async fn delete_app(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(app_id): Path<Uuid>,
) -> Result<(), AppError> {
    let app = find_app(&state, app_id, user.id).await?;

    let mut tx = state.db.begin().await?;

    sqlx::query(
        "DELETE FROM documents WHERE owner_id = $1 AND (slug = $2 OR slug LIKE $2 || '/%')",
    )
    .bind(user.id)
    .bind(&app.slug)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM apps WHERE id = $1")
        .bind(app_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// POST /api/v1/apps/:id/sync
///
/// Pull the current page set of this app's source template into this app.
/// Runs as one transaction: every template page is created, overwritten or
/// skipped, and the destination's template-version bookkeeping moves to the
/// source's version only when nothing was skipped, so a partial sync keeps
/// offering the remaining pages on the next run.
pub async fn sync_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(app_id): Path<Uuid>,
    Json(req): Json<SyncTemplateRequest>,
) -> Result<Json<TemplateSyncReport>, AppError> {
    let dest = find_app(&state, app_id, user.id).await?;

    let source_id = dest.template_source.ok_or_else(|| {
        AppError::Validation("App was not created from a template".to_string())
    })?;

    let source_row: Option<AppRow> = sqlx::query_as(&format!(
        "SELECT {APP_COLUMNS} FROM apps WHERE id = $1"
    ))
    .bind(source_id)
    .fetch_optional(&state.db)
    .await?;

    let source = source_row.map(row_to_app).ok_or(AppError::NotFound)?;

    if !source.is_public_template() {
        return Err(AppError::Validation(
            "Source app is not a public template".to_string(),
        ));
    }

    let source_pages: Vec<(String, Value)> = sqlx::query_as(
        r#"
        SELECT slug, tree
        FROM documents
        WHERE owner_id = $1 AND (slug = $2 OR slug LIKE $2 || '/%')
        ORDER BY slug
        "#,
    )
    .bind(source.owner_id)
    .bind(&source.slug)
    .fetch_all(&state.db)
    .await?;

    let now = Utc::now();
    let mut created = 0u32;
    let mut overwritten = 0u32;
    let mut skipped = 0u32;

    let mut tx = state.db.begin().await?;

    // Older apps stored the landing page at the bare app slug. Move it to
    // the canonical home slug before syncing so it is updated, not shadowed.
    let dest_home = home_slug(&dest.slug);
    let home_exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM documents WHERE owner_id = $1 AND slug = $2")
            .bind(user.id)
            .bind(&dest_home)
            .fetch_optional(&mut *tx)
            .await?;

    if home_exists.is_none() {
        sqlx::query("UPDATE documents SET slug = $1 WHERE owner_id = $2 AND slug = $3")
            .bind(&dest_home)
            .bind(user.id)
            .bind(&dest.slug)
            .execute(&mut *tx)
            .await?;
    }

    for (page_slug, page_tree) in &source_pages {
        let target_slug = map_target_slug(&source.slug, &dest.slug, page_slug);

        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM documents WHERE owner_id = $1 AND slug = $2")
                .bind(user.id)
                .bind(&target_slug)
                .fetch_optional(&mut *tx)
                .await?;

        match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (id, owner_id, slug, status, tree, published_at, updated_at)
                    VALUES ($1, $2, $3, 'draft', $4, NULL, $5)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(user.id)
                .bind(&target_slug)
                .bind(page_tree)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                created += 1;
            }
            Some(_) if !req.overwrite_existing => {
                skipped += 1;
            }
            Some((existing_id,)) => {
                sqlx::query(
                    r#"
                    UPDATE documents
                    SET tree = $1, status = 'draft', published_at = NULL, updated_at = $2
                    WHERE id = $3
                    "#,
                )
                .bind(page_tree)
                .bind(now)
                .bind(existing_id)
                .execute(&mut *tx)
                .await?;
                overwritten += 1;
            }
        }
    }

    // A run with skips did not fully apply the source's page set, so the
    // recorded version stays put and a future sync is still offered.
    let applied_version = if skipped == 0 {
        source.template_version
    } else {
        dest.template_version
    };

    sqlx::query(
        r#"
        UPDATE apps
        SET template_version = $1, last_template_sync_at = $2, updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(applied_version)
    .bind(now)
    .bind(dest.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        app = %dest.slug,
        created,
        overwritten,
        skipped,
        "template sync applied version {}",
        applied_version
    );

    Ok(Json(TemplateSyncReport {
        created,
        overwritten,
        skipped,
        applied_version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_joins_words_with_dashes() {
        assert_eq!(slugify("My Portfolio"), "my-portfolio");
        assert_eq!(slugify("  Café & Bar!  "), "café-bar");
        assert_eq!(slugify("already-slugged"), "already-slugged");
    }

    #[test]
    fn template_own_page_maps_to_destination_home() {
        assert_eq!(map_target_slug("tmpl", "mine", "tmpl"), "mine/home");
        assert_eq!(map_target_slug("tmpl", "mine", "tmpl/home"), "mine/home");
    }

    #[test]
    fn nested_pages_keep_their_relative_path() {
        assert_eq!(map_target_slug("tmpl", "mine", "tmpl/about"), "mine/about");
        assert_eq!(
            map_target_slug("tmpl", "mine", "tmpl/shop/faq"),
            "mine/shop/faq"
        );
    }
}
