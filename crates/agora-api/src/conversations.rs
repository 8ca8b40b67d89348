use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use tracing::error;
use uuid::Uuid;

use agora_types::api::{
    Claims, ConversationSummary, CreateConversationRequest, CreateConversationResponse,
};
use agora_types::models::ProfileSummary;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

/// POST /conversations. Resolve the direct conversation with another user,
/// creating it on first contact. Repeat calls for the same pair, in either
/// order, answer with the same id. The response always carries the full
/// envelope: a resolved id on success, a null id plus the error string when
/// the store fails.
pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<(StatusCode, Json<CreateConversationResponse>)> {
    if req.other_user_id == claims.sub {
        return Err(ApiError::Validation(
            "cannot start a conversation with yourself".into(),
        ));
    }

    let other_id = req.other_user_id.to_string();
    if state.db.get_user_by_id(&other_id)?.is_none() {
        return Err(ApiError::NotFound);
    }

    let candidate = Uuid::new_v4();
    match state.db.get_or_create_conversation(
        &candidate.to_string(),
        &claims.sub.to_string(),
        &other_id,
    ) {
        Ok(id) => Ok((
            StatusCode::OK,
            Json(CreateConversationResponse {
                conversation_id: Some(crate::parse_uuid(&id, "conversation")),
                error: None,
            }),
        )),
        Err(e) => {
            error!("conversation resolve failed: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CreateConversationResponse {
                    conversation_id: None,
                    error: Some(e.to_string()),
                }),
            ))
        }
    }
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    let rows = tokio::task::spawn_blocking(move || db.db.list_conversations(&user_id))
        .await
        .map_err(|e| ApiError::Store(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    let conversations = rows
        .into_iter()
        .map(|row| ConversationSummary {
            id: crate::parse_uuid(&row.id, "conversation"),
            other: ProfileSummary {
                id: crate::parse_uuid(&row.other_id, "conversation participant"),
                username: row.other_username.unwrap_or_else(|| "unknown".to_string()),
                full_name: row.other_full_name,
                avatar_url: row.other_avatar_url,
            },
            created_at: crate::parse_timestamp(&row.created_at, "conversation"),
        })
        .collect();

    Ok(Json(conversations))
}
