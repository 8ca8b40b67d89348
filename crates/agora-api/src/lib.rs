pub mod auth;
pub mod conversations;
pub mod error;
pub mod interactions;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod reactions;

#[cfg(test)]
mod test_util;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, patch, post},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::auth::AppState;

/// The REST surface: public auth endpoints plus the session-guarded API.
/// The caller mounts the WebSocket route and the outer layers.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/{user_id}", get(profiles::get_profile))
        .route("/users/{user_id}/follow", post(profiles::toggle_follow))
        .route("/profile", patch(profiles::update_profile))
        .route("/posts", get(posts::list_posts))
        .route("/posts", post(posts::create_post))
        .route("/posts/{post_id}/like", post(posts::toggle_like))
        .route("/posts/{post_id}/comments", post(posts::create_comment))
        .route(
            "/posts/{post_id}/interactions",
            post(interactions::record_interaction),
        )
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/notifications/mark-all-read",
            post(notifications::mark_all_read),
        )
        .route("/notifications/mark-read", post(notifications::mark_read))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations", post(conversations::create_conversation))
        .route(
            "/conversations/{conversation_id}/messages",
            get(messages::get_messages),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            post(messages::send_message),
        )
        .route(
            "/conversations/{conversation_id}/messages/{message_id}/reactions",
            post(reactions::toggle_reaction),
        )
        .layer(from_fn(middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

/// SQLite stores `datetime('now')` as "YYYY-MM-DD HH:MM:SS" without a
/// timezone. Accept RFC 3339 too so externally written rows survive.
/// Corrupt values are logged and replaced, never fatal on a read path.
pub(crate) fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, what, e);
            DateTime::default()
        })
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, what, e);
        Uuid::default()
    })
}

#[cfg(test)]
mod tests {
    use super::parse_timestamp;

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let sqlite = parse_timestamp("2026-08-25 12:30:00", "test row");
        assert_eq!(sqlite.to_rfc3339(), "2026-08-25T12:30:00+00:00");

        let rfc = parse_timestamp("2026-08-25T12:30:00Z", "test row");
        assert_eq!(rfc, sqlite);
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        let parsed = parse_timestamp("not-a-date", "test row");
        assert_eq!(parsed, chrono::DateTime::<chrono::Utc>::default());
    }
}
