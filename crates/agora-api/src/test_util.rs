//! Shared helpers for handler tests: an in-memory state, seeded sessions,
//! and a oneshot request runner over the real router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt as _;
use tower::ServiceExt as _;
use uuid::Uuid;

use agora_db::Database;
use agora_feed::feed::ChangeFeed;

use crate::auth::{AppState, AppStateInner};

/// Same lookup the auth middleware does, so minted tokens always verify.
pub(crate) fn test_secret() -> String {
    std::env::var("AGORA_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into())
}

pub(crate) fn test_state() -> AppState {
    test_state_with_coalesce(0)
}

pub(crate) fn test_state_with_coalesce(view_coalesce_secs: u64) -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory db"),
        jwt_secret: test_secret(),
        feed: ChangeFeed::new(),
        view_coalesce_secs,
    })
}

/// Insert a user row directly and mint a token for it. The stored hash is a
/// placeholder; seeded sessions never go through the login route.
pub(crate) fn seed_session(state: &AppState, username: &str) -> (Uuid, String) {
    let id = Uuid::new_v4();
    state
        .db
        .create_user(&id.to_string(), username, "placeholder-hash", None)
        .unwrap();
    let token = crate::auth::create_token(&state.jwt_secret, id, username).unwrap();
    (id, token)
}

pub(crate) async fn request(
    state: AppState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    crate::router(state).oneshot(request).await.unwrap()
}

pub(crate) async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
