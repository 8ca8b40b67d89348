use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use agora_db::models::ProfileRow;
use agora_types::api::{Claims, ProfileResponse, UpdateProfileRequest};
use agora_types::models::NotificationKind;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

fn profile_response(row: ProfileRow) -> ProfileResponse {
    ProfileResponse {
        id: crate::parse_uuid(&row.id, "user"),
        username: row.username,
        full_name: row.full_name,
        avatar_url: row.avatar_url,
        created_at: crate::parse_timestamp(&row.created_at, "user"),
        post_count: row.post_count,
        follower_count: row.follower_count,
        following_count: row.following_count,
    }
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<Json<ProfileResponse>> {
    let db = state.clone();
    let uid = user_id.to_string();

    let row = tokio::task::spawn_blocking(move || db.db.get_profile(&uid))
        .await
        .map_err(|e| ApiError::Store(anyhow::anyhow!("spawn_blocking join error: {e}")))??
        .ok_or(ApiError::NotFound)?;

    Ok(Json(profile_response(row)))
}

/// Update the caller's own profile. Absent fields stay untouched.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    if let Some(name) = req.full_name.as_deref() {
        if name.is_empty() || name.len() > 80 {
            return Err(ApiError::Validation(
                "full_name must be 1-80 characters".into(),
            ));
        }
    }

    let user_id = claims.sub.to_string();
    state
        .db
        .update_profile(&user_id, req.full_name.as_deref(), req.avatar_url.as_deref())?;

    let row = state.db.get_profile(&user_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(profile_response(row)))
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<serde_json::Value>> {
    if user_id == claims.sub {
        return Err(ApiError::Validation("cannot follow yourself".into()));
    }

    let followee = user_id.to_string();
    if state.db.get_user_by_id(&followee)?.is_none() {
        return Err(ApiError::NotFound);
    }

    let follower = claims.sub.to_string();
    let following = state
        .db
        .toggle_follow(&Uuid::new_v4().to_string(), &follower, &followee)?;

    // Only a new follow notifies; unfollowing never retracts the notification.
    if following {
        state.db.insert_notification(
            &Uuid::new_v4().to_string(),
            &followee,
            &follower,
            NotificationKind::Follow.as_str(),
            None,
            None,
        )?;
    }

    Ok(Json(serde_json::json!({ "following": following })))
}
