use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::warn;
use uuid::Uuid;

use agora_types::api::{Claims, RecordInteractionRequest};
use agora_types::models::InteractionKind;

use crate::auth::AppState;

fn accepted() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "success": true })),
    )
}

/// Fire-and-forget engagement telemetry. With tracking disabled nothing is
/// written. With it enabled one row is appended per call, duplicates and
/// all. Store failures are logged and swallowed; recording must never break
/// the interaction that triggered it.
pub async fn record_interaction(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RecordInteractionRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !req.tracking_enabled {
        return accepted();
    }

    let user_id = claims.sub.to_string();
    let post_id = post_id.to_string();

    // View coalescing window (0 = off): a repeat view of the same post
    // inside the window is not recorded again. Check-then-insert without a
    // lock; a racing duplicate is acceptable for telemetry.
    if req.kind == InteractionKind::View && state.view_coalesce_secs > 0 {
        match state
            .db
            .has_recent_view(&user_id, &post_id, state.view_coalesce_secs)
        {
            Ok(true) => return accepted(),
            Ok(false) => {}
            Err(e) => warn!("view coalesce check failed: {}", e),
        }
    }

    if let Err(e) = state.db.record_interaction(
        &Uuid::new_v4().to_string(),
        &user_id,
        &post_id,
        req.kind.as_str(),
        req.duration_secs,
    ) {
        warn!(
            "failed to record {} interaction for post {}: {}",
            req.kind.as_str(),
            post_id,
            e
        );
    }

    accepted()
}
