use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use agora_types::api::{Claims, MessageResponse, ReactionGroup, SendMessageRequest};
use agora_types::events::FeedEvent;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor-based pagination: pass the `created_at` of the oldest message
    /// from the previous page to fetch older messages.
    pub before: Option<String>,
}

fn default_limit() -> u32 {
    50
}

/// Membership gate shared by every message route. A conversation the caller
/// is not part of answers exactly like one that does not exist.
pub(crate) fn require_participant(
    state: &AppState,
    conversation_id: &str,
    user_id: &str,
) -> ApiResult<()> {
    let (user_a, user_b) = state
        .db
        .conversation_participants(conversation_id)?
        .ok_or(ApiError::NotFound)?;
    if user_a != user_id && user_b != user_id {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".into()));
    }

    require_participant(&state, &conversation_id.to_string(), &claims.sub.to_string())?;

    let message_id = Uuid::new_v4();
    state.db.insert_message(
        &message_id.to_string(),
        &conversation_id.to_string(),
        &claims.sub.to_string(),
        &req.content,
    )?;

    state
        .feed
        .publish(FeedEvent::MessagesChanged { conversation_id });

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            id: message_id,
            conversation_id,
            author_id: claims.sub,
            author_username: claims.username.clone(),
            content: req.content,
            created_at: chrono::Utc::now(),
            reactions: vec![],
        }),
    ))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    require_participant(&state, &conversation_id.to_string(), &claims.sub.to_string())?;

    // Run all blocking DB queries off the async runtime
    let db = state.clone();
    let cid = conversation_id.to_string();
    let limit = query.limit.min(200);
    let before = query.before;

    let (rows, reaction_rows) = tokio::task::spawn_blocking(move || {
        let rows = db.db.get_messages(&cid, limit, before.as_deref())?;

        let message_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let reaction_rows = db.db.get_reactions_for_messages(&message_ids)?;

        Ok::<_, anyhow::Error>((rows, reaction_rows))
    })
    .await
    .map_err(|e| ApiError::Store(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    // Group reactions by message_id -> emoji -> user_ids (cheap in-memory
    // work, fine on the async thread)
    let mut reaction_map: HashMap<String, HashMap<String, Vec<Uuid>>> = HashMap::new();
    for r in &reaction_rows {
        let emoji_map = reaction_map.entry(r.message_id.clone()).or_default();
        let user_ids = emoji_map.entry(r.emoji.clone()).or_default();
        if let Ok(uid) = r.user_id.parse::<Uuid>() {
            user_ids.push(uid);
        }
    }

    let messages: Vec<MessageResponse> = rows
        .into_iter()
        .map(|row| {
            let reactions = reaction_map
                .get(&row.id)
                .map(|emoji_map| {
                    emoji_map
                        .iter()
                        .map(|(emoji, user_ids)| ReactionGroup {
                            emoji: emoji.clone(),
                            count: user_ids.len(),
                            user_ids: user_ids.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            MessageResponse {
                id: crate::parse_uuid(&row.id, "message"),
                conversation_id: crate::parse_uuid(&row.conversation_id, "message"),
                author_id: crate::parse_uuid(&row.author_id, "message author"),
                author_username: row.author_username,
                content: row.content,
                created_at: crate::parse_timestamp(&row.created_at, "message"),
                reactions,
            }
        })
        .collect();

    Ok(Json(messages))
}
