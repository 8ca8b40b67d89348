use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use agora_db::models::NotificationRow;
use agora_types::api::{Claims, CommentSummary, NotificationResponse, PostSummary};
use agora_types::models::{NotificationKind, ProfileSummary};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// GET /notifications, the notifications page load. Two steps in strict
/// order inside one blocking closure: read the list, then mark everything
/// read. The response carries the read-state as of the visit while the
/// store ends all-read. The coupling lives here in the handler; the store
/// functions stay single-purpose.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let db = state.clone();
    let user_id = claims.sub.to_string();
    let limit = query.limit.min(200);

    let rows = tokio::task::spawn_blocking(move || {
        let rows = db.db.list_notifications(&user_id, limit)?;
        db.db.mark_all_notifications_read(&user_id)?;
        Ok::<_, anyhow::Error>(rows)
    })
    .await
    .map_err(|e| ApiError::Store(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    let notifications = rows.into_iter().filter_map(notification_response).collect();
    Ok(Json(notifications))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<serde_json::Value>> {
    let count = state
        .db
        .unread_notification_count(&claims.sub.to_string())?;
    Ok(Json(serde_json::json!({ "count": count })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<serde_json::Value>> {
    let affected = state
        .db
        .mark_all_notifications_read(&claims.sub.to_string())?;
    debug!("marked {} notifications read for {}", affected, claims.sub);
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /notifications/mark-read. The body is parsed by hand so a missing
/// or malformed notification_id turns into a 400 with an error body instead
/// of a framework rejection.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let notification_id = body
        .get("notification_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::Validation("notification_id is required".into()))?;

    let notification_id: Uuid = notification_id
        .parse()
        .map_err(|_| ApiError::Validation("notification_id must be a UUID".into()))?;

    // Zero rows affected (missing row or foreign owner) is still success.
    state
        .db
        .mark_notification_read(&notification_id.to_string(), &claims.sub.to_string())?;

    Ok(Json(serde_json::json!({ "success": true })))
}

fn notification_response(row: NotificationRow) -> Option<NotificationResponse> {
    // An unrecognized kind means a row written by a newer version; skip the
    // row rather than failing the whole page.
    let kind = match NotificationKind::parse(&row.kind) {
        Some(kind) => kind,
        None => {
            warn!("Unknown notification kind '{}' on '{}'", row.kind, row.id);
            return None;
        }
    };

    let actor = ProfileSummary {
        id: crate::parse_uuid(&row.actor_id, "notification actor"),
        username: row.actor_username.unwrap_or_else(|| "unknown".to_string()),
        full_name: row.actor_full_name,
        avatar_url: row.actor_avatar_url,
    };

    let post = match (row.post_id, row.post_content) {
        (Some(id), Some(content)) => Some(PostSummary {
            id: crate::parse_uuid(&id, "notification post"),
            content,
            image_url: row.post_image_url,
        }),
        _ => None,
    };

    let comment = match (row.comment_id, row.comment_content) {
        (Some(id), Some(content)) => Some(CommentSummary {
            id: crate::parse_uuid(&id, "notification comment"),
            content,
        }),
        _ => None,
    };

    Some(NotificationResponse {
        id: crate::parse_uuid(&row.id, "notification"),
        kind,
        is_read: row.is_read,
        created_at: crate::parse_timestamp(&row.created_at, "notification"),
        actor,
        post,
        comment,
    })
}
