use std::sync::OnceLock;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pagehub_shared::{api::SaveVariableRequest, Variable};
use regex::Regex;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

type VariableRow = (
    Uuid,           // id
    Uuid,           // user_id
    String,         // key
    String,         // value
    String,         // label
    String,         // category
    Option<String>, // description
    DateTime<Utc>,  // created_at
    DateTime<Utc>,  // updated_at
);

fn row_to_variable(row: VariableRow) -> Variable {
    Variable {
        id: row.0,
        user_id: row.1,
        key: row.2,
        value: row.3,
        label: row.4,
        category: row.5,
        description: row.6,
        created_at: row.7,
        updated_at: row.8,
    }
}

/// Keys must be addressable from placeholder tokens in page text.
fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_][a-z0-9_.\-]*$").expect("key pattern is valid"))
}

/// GET /api/v1/variables
pub async fn list_variables(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Variable>>, AppError> {
    let rows: Vec<VariableRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, key, value, label, category, description, created_at, updated_at
        FROM variables
        WHERE user_id = $1
        ORDER BY category, key
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(row_to_variable).collect()))
}

/// PUT /api/v1/variables
///
/// Upsert by (user, key). Published pages pick the new value up on their
/// next read; nothing is republished.
pub async fn save_variable(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SaveVariableRequest>,
) -> Result<Json<Variable>, AppError> {
    if !key_pattern().is_match(&req.key) {
        return Err(AppError::Validation(format!(
            "Invalid variable key: {}",
            req.key
        )));
    }
    if req.label.trim().is_empty() {
        return Err(AppError::Validation("Variable label is required".to_string()));
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM variables WHERE user_id = $1 AND key = $2")
            .bind(user.id)
            .bind(&req.key)
            .fetch_optional(&state.db)
            .await?;

    let row: VariableRow = match existing {
        Some((id,)) => {
            sqlx::query_as(
                r#"
                UPDATE variables
                SET value = $1, label = $2, category = $3, description = $4, updated_at = NOW()
                WHERE id = $5
                RETURNING id, user_id, key, value, label, category, description, created_at, updated_at
                "#,
            )
            .bind(&req.value)
            .bind(&req.label)
            .bind(&req.category)
            .bind(&req.description)
            .bind(id)
            .fetch_one(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                INSERT INTO variables (id, user_id, key, value, label, category, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, user_id, key, value, label, category, description, created_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(&req.key)
            .bind(&req.value)
            .bind(&req.label)
            .bind(&req.category)
            .bind(&req.description)
            .fetch_one(&state.db)
            .await?
        }
    };

    Ok(Json(row_to_variable(row)))
}

/// DELETE /api/v1/variables/:key
pub async fn delete_variable(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM variables WHERE user_id = $1 AND key = $2")
        .bind(user.id)
        .bind(&key)
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
    fn key_pattern_accepts_token_addressable_keys() {
        for key in ["name", "phone_mobile", "social.x", "color-1", "_internal"] {
            assert!(key_pattern().is_match(key), "expected {key} to be valid");
        }
    }

    #[test]
    fn key_pattern_rejects_unaddressable_keys() {
        for key in ["", "Name", "with space", ".leading", "-leading", "émoji"] {
            assert!(!key_pattern().is_match(key), "expected {key} to be invalid");
        }
    }
}
