use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pagehub_shared::{
    api::{AcceptGroupResponse, GroupOffer, SaveGroupRequest},
    tree, Group, SubscriptionStatus,
};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

type GroupRow = (
    Uuid,           // id
    Option<Uuid>,   // owner_id
    String,         // name
    Value,          // tree
    bool,           // public
    bool,           // auto_include
    Option<String>, // description
    i32,            // version
    Option<Uuid>,   // source_group_id
    Option<Uuid>,   // source_owner_id
    DateTime<Utc>,  // created_at
    DateTime<Utc>,  // updated_at
);

fn row_to_group(row: GroupRow) -> Group {
    Group {
        id: row.0,
        owner_id: row.1,
        name: row.2,
        tree: row.3,
        public: row.4,
        auto_include: row.5,
        description: row.6,
        version: row.7,
        source_group_id: row.8,
        source_owner_id: row.9,
        created_at: row.10,
        updated_at: row.11,
    }
}

const GROUP_COLUMNS: &str = "id, owner_id, name, tree, public, auto_include, description, \
                             version, source_group_id, source_owner_id, created_at, updated_at";

/// Nth candidate when probing for a free name: `X`, `X (2)`, `X (3)`, …
fn candidate_name(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{} ({})", base, attempt)
    }
}

/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Group>>, AppError> {
    let rows: Vec<GroupRow> = sqlx::query_as(&format!(
        "SELECT {GROUP_COLUMNS} FROM groups WHERE owner_id = $1 ORDER BY name"
    ))
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(row_to_group).collect()))
}

/// GET /api/v1/groups/offers
///
/// The public catalog from the caller's point of view: every shared group
/// they do not own, with where they stand on it.
pub async fn list_offers(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<GroupOffer>>, AppError> {
    let rows: Vec<(
        Uuid,
        Option<Uuid>,
        String,
        Value,
        bool,
        bool,
        Option<String>,
        i32,
        Option<Uuid>,
        Option<Uuid>,
        DateTime<Utc>,
        DateTime<Utc>,
        Option<SubscriptionStatus>,
    )> = sqlx::query_as(
        r#"
        SELECT g.id, g.owner_id, g.name, g.tree, g.public, g.auto_include, g.description,
               g.version, g.source_group_id, g.source_owner_id, g.created_at, g.updated_at,
               gs.status
        FROM groups g
        LEFT JOIN group_subscriptions gs ON gs.group_id = g.id AND gs.user_id = $1
        WHERE g.public = TRUE AND (g.owner_id IS NULL OR g.owner_id != $1)
        ORDER BY g.name
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    let offers = rows
        .into_iter()
        .map(|row| {
            let status = row.12;
            GroupOffer {
                group: row_to_group((
                    row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7, row.8, row.9, row.10,
                    row.11,
                )),
                subscription_status: status,
            }
        })
        .collect();

    Ok(Json(offers))
}

/// PUT /api/v1/groups
///
/// Upsert by (owner, name): saving over an existing name replaces the
/// stored subtree and bumps the version instead of creating a duplicate.
/// The subtree is sanitized on the way in, since stored groups are what
/// later gets copied into other owners' pages.
pub async fn save_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SaveGroupRequest>,
) -> Result<Json<Group>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Group name is required".to_string()));
    }

    let clean_tree = tree::sanitize(&req.tree);

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM groups WHERE owner_id = $1 AND name = $2")
            .bind(user.id)
            .bind(&req.name)
            .fetch_optional(&state.db)
            .await?;

    let row: GroupRow = match existing {
        Some((id,)) => {
            sqlx::query_as(&format!(
                r#"
                UPDATE groups
                SET tree = $1, public = $2, auto_include = $3, description = $4,
                    version = version + 1, updated_at = NOW()
                WHERE id = $5
                RETURNING {GROUP_COLUMNS}
                "#
            ))
            .bind(&clean_tree)
            .bind(req.public)
            .bind(req.auto_include)
            .bind(&req.description)
            .bind(id)
            .fetch_one(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(&format!(
                r#"
                INSERT INTO groups (id, owner_id, name, tree, public, auto_include, description, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
                RETURNING {GROUP_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(&req.name)
            .bind(&clean_tree)
            .bind(req.public)
            .bind(req.auto_include)
            .bind(&req.description)
            .fetch_one(&state.db)
            .await?
        }
    };

    Ok(Json(row_to_group(row)))
}

/// POST /api/v1/groups/:id/accept
///
/// Deep-clone a public group into a private copy owned by the caller and
/// record the subscription. Accepting again while the clone still exists
/// returns that clone; if it was deleted since, a fresh one is made. The
/// clone keeps the source's authoring shape untouched.
pub async fn accept_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<AcceptGroupResponse>, AppError> {
    let source_row: Option<GroupRow> = sqlx::query_as(&format!(
        "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
    ))
    .bind(group_id)
    .fetch_optional(&state.db)
    .await?;

    let source = source_row.map(row_to_group).ok_or(AppError::NotFound)?;

    if !source.public {
        return Err(AppError::Forbidden);
    }
    if source.owner_id == Some(user.id) {
        return Err(AppError::Validation(
            "You already own this group".to_string(),
        ));
    }

    let subscription: Option<(Uuid, SubscriptionStatus, Option<Uuid>)> = sqlx::query_as(
        "SELECT id, status, cloned_group_id FROM group_subscriptions WHERE user_id = $1 AND group_id = $2",
    )
    .bind(user.id)
    .bind(group_id)
    .fetch_optional(&state.db)
    .await?;

    // Re-accept is a no-op while the recorded clone is still around.
    if let Some((sub_id, SubscriptionStatus::Accepted, Some(clone_id))) = subscription {
        let clone_row: Option<GroupRow> = sqlx::query_as(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1 AND owner_id = $2"
        ))
        .bind(clone_id)
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;

        if let Some(row) = clone_row {
            return Ok(Json(AcceptGroupResponse {
                group: row_to_group(row),
                subscription_id: sub_id,
            }));
        }
    }

    let mut tx = state.db.begin().await?;

    // Probe for a free name for this owner: "X", "X (2)", "X (3)", …
    let mut name = candidate_name(&source.name, 1);
    let mut attempt = 1u32;
    loop {
        let taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM groups WHERE owner_id = $1 AND name = $2")
                .bind(user.id)
                .bind(&name)
                .fetch_optional(&mut *tx)
                .await?;
        if taken.is_none() {
            break;
        }
        attempt += 1;
        name = candidate_name(&source.name, attempt);
    }

    let clone_row: GroupRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO groups (id, owner_id, name, tree, public, auto_include, description,
                            version, source_group_id, source_owner_id)
        VALUES ($1, $2, $3, $4, FALSE, $5, $6, 1, $7, $8)
        RETURNING {GROUP_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&name)
    .bind(&source.tree)
    .bind(source.auto_include)
    .bind(&source.description)
    .bind(source.id)
    .bind(source.owner_id)
    .fetch_one(&mut *tx)
    .await?;

    let clone = row_to_group(clone_row);

    let subscription_id = match subscription {
        Some((sub_id, _, _)) => {
            sqlx::query(
                r#"
                UPDATE group_subscriptions
                SET status = 'accepted', cloned_group_id = $1, updated_at = NOW()
                WHERE id = $2
                "#,
            )
            .bind(clone.id)
            .bind(sub_id)
            .execute(&mut *tx)
            .await?;
            sub_id
        }
        None => {
            let (sub_id,): (Uuid,) = sqlx::query_as(
                r#"
                INSERT INTO group_subscriptions (id, user_id, group_id, status, cloned_group_id)
                VALUES ($1, $2, $3, 'accepted', $4)
                RETURNING id
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(group_id)
            .bind(clone.id)
            .fetch_one(&mut *tx)
            .await?;
            sub_id
        }
    };

    tx.commit().await?;

    Ok(Json(AcceptGroupResponse {
        group: clone,
        subscription_id,
    }))
}

/// POST /api/v1/groups/:id/decline
pub async fn decline_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
) -> Result<(), AppError> {
    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM groups WHERE id = $1 AND public = TRUE")
            .bind(group_id)
            .fetch_optional(&state.db)
            .await?;

    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let existing: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM group_subscriptions WHERE user_id = $1 AND group_id = $2",
    )
    .bind(user.id)
    .bind(group_id)
    .fetch_optional(&state.db)
    .await?;

    match existing {
        Some((sub_id,)) => {
            sqlx::query(
                "UPDATE group_subscriptions SET status = 'declined', updated_at = NOW() WHERE id = $1",
            )
            .bind(sub_id)
            .execute(&state.db)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO group_subscriptions (id, user_id, group_id, status)
                VALUES ($1, $2, $3, 'declined')
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(group_id)
            .execute(&state.db)
            .await?;
        }
    }

    Ok(())
}

/// DELETE /api/v1/groups/:id
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM groups WHERE id = $1 AND owner_id = $2")
        .bind(group_id)
        .bind(user.id)
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
    fn first_candidate_is_the_bare_name() {
        assert_eq!(candidate_name("Socials", 0), "Socials");
        assert_eq!(candidate_name("Socials", 1), "Socials");
    }

    #[test]
    fn later_candidates_are_numbered_from_two() {
        assert_eq!(candidate_name("Socials", 2), "Socials (2)");
        assert_eq!(candidate_name("Socials", 3), "Socials (3)");
        assert_eq!(candidate_name("X (2)", 2), "X (2) (2)");
    }
}
