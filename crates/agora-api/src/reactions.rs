use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use agora_types::api::{Claims, ToggleReactionRequest};
use agora_types::events::FeedEvent;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::messages::require_participant;

/// POST /conversations/{id}/messages/{id}/reactions. Toggles the caller's
/// reaction with the given emoji. Both directions publish a change event so
/// watchers refetch either way.
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ToggleReactionRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_participant(&state, &conversation_id.to_string(), &claims.sub.to_string())?;

    // The message must belong to the conversation in the path.
    let owning = state
        .db
        .get_message_conversation(&message_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    if owning != conversation_id.to_string() {
        return Err(ApiError::NotFound);
    }

    let added = state.db.toggle_message_reaction(
        &Uuid::new_v4().to_string(),
        &message_id.to_string(),
        &claims.sub.to_string(),
        &req.emoji,
    )?;

    state
        .feed
        .publish(FeedEvent::ReactionsChanged { conversation_id });

    Ok(Json(serde_json::json!({ "added": added })))
}
