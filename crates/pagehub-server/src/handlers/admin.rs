use axum::{extract::State, Extension, Json};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

#[derive(Debug, serde::Serialize)]
pub struct AdminOverview {
    pub users: i64,
    pub documents: i64,
    pub published_documents: i64,
    pub apps: i64,
    pub template_apps: i64,
    pub groups: i64,
}

/// GET /api/v1/admin/overview
pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AdminOverview>, AppError> {
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }

    let (users, documents, published_documents, apps, template_apps, groups): (
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users),
            (SELECT COUNT(*) FROM documents),
            (SELECT COUNT(*) FROM documents WHERE status = 'published'),
            (SELECT COUNT(*) FROM apps),
            (SELECT COUNT(*) FROM apps WHERE is_template = TRUE),
            (SELECT COUNT(*) FROM groups)
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(AdminOverview {
        users,
        documents,
        published_documents,
        apps,
        template_apps,
        groups,
    }))
}
