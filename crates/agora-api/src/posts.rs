use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use agora_types::api::{
    Claims, CommentResponse, CreateCommentRequest, CreatePostRequest, PostResponse,
};
use agora_types::models::NotificationKind;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".into()));
    }

    let post_id = Uuid::new_v4();
    let now = chrono::Utc::now();

    state.db.insert_post(
        &post_id.to_string(),
        &claims.sub.to_string(),
        &req.content,
        req.image_url.as_deref(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            id: post_id,
            author_id: claims.sub,
            author_username: claims.username.clone(),
            content: req.content,
            image_url: req.image_url,
            created_at: now,
            like_count: 0,
            comment_count: 0,
        }),
    ))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<Json<Vec<PostResponse>>> {
    // Run all blocking DB queries off the async runtime
    let db = state.clone();
    let limit = query.limit.min(200);

    let rows = tokio::task::spawn_blocking(move || db.db.list_posts(limit))
        .await
        .map_err(|e| ApiError::Store(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    let posts = rows
        .into_iter()
        .map(|row| PostResponse {
            id: crate::parse_uuid(&row.id, "post"),
            author_id: crate::parse_uuid(&row.author_id, "post"),
            author_username: row.author_username,
            content: row.content,
            image_url: row.image_url,
            created_at: crate::parse_timestamp(&row.created_at, "post"),
            like_count: row.like_count,
            comment_count: row.comment_count,
        })
        .collect();

    Ok(Json(posts))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<serde_json::Value>> {
    let post = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let user_id = claims.sub.to_string();
    let liked = state
        .db
        .toggle_like(&Uuid::new_v4().to_string(), &post.id, &user_id)?;

    // A fresh like notifies the author; liking your own post does not, and
    // unliking never retracts the notification.
    if liked && post.author_id != user_id {
        state.db.insert_notification(
            &Uuid::new_v4().to_string(),
            &post.author_id,
            &user_id,
            NotificationKind::Like.as_str(),
            Some(&post.id),
            None,
        )?;
    }

    Ok(Json(serde_json::json!({ "liked": liked })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".into()));
    }

    let post = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let comment_id = Uuid::new_v4();
    let author_id = claims.sub.to_string();
    let now = chrono::Utc::now();

    state
        .db
        .insert_comment(&comment_id.to_string(), &post.id, &author_id, &req.content)?;

    if post.author_id != author_id {
        state.db.insert_notification(
            &Uuid::new_v4().to_string(),
            &post.author_id,
            &author_id,
            NotificationKind::Comment.as_str(),
            Some(&post.id),
            Some(&comment_id.to_string()),
        )?;
    }

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: comment_id,
            post_id,
            author_id: claims.sub,
            author_username: claims.username.clone(),
            content: req.content,
            created_at: now,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use crate::test_util::{json_body, request, seed_session, test_state};

    #[tokio::test]
    async fn create_then_list_roundtrip() {
        let state = test_state();
        let (_, token) = seed_session(&state, "alice");

        let response = request(
            state.clone(),
            "POST",
            "/posts",
            Some(&token),
            Some(json!({ "content": "first post", "image_url": null })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = request(state, "GET", "/posts", Some(&token), None).await;
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["content"], "first post");
        assert_eq!(body[0]["author_username"], "alice");
        assert_eq!(body[0]["like_count"], 0);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let state = test_state();
        let (_, token) = seed_session(&state, "alice");

        let response = request(
            state,
            "POST",
            "/posts",
            Some(&token),
            Some(json!({ "content": "   " })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn like_notifies_the_author_and_unlike_keeps_it() {
        let state = test_state();
        let (bob_id, _) = seed_session(&state, "bob");
        let (_, alice_token) = seed_session(&state, "alice");

        let post_id = Uuid::new_v4().to_string();
        state
            .db
            .insert_post(&post_id, &bob_id.to_string(), "hello", None)
            .unwrap();

        let response = request(
            state.clone(),
            "POST",
            &format!("/posts/{}/like", post_id),
            Some(&alice_token),
            None,
        )
        .await;
        assert_eq!(json_body(response).await["liked"], true);

        let inbox = state.db.list_notifications(&bob_id.to_string(), 50).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, "like");
        assert_eq!(inbox[0].post_content.as_deref(), Some("hello"));

        let response = request(
            state.clone(),
            "POST",
            &format!("/posts/{}/like", post_id),
            Some(&alice_token),
            None,
        )
        .await;
        assert_eq!(json_body(response).await["liked"], false);
        assert_eq!(
            state
                .db
                .list_notifications(&bob_id.to_string(), 50)
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn liking_your_own_post_does_not_notify() {
        let state = test_state();
        let (alice_id, token) = seed_session(&state, "alice");

        let post_id = Uuid::new_v4().to_string();
        state
            .db
            .insert_post(&post_id, &alice_id.to_string(), "mine", None)
            .unwrap();

        let response = request(
            state.clone(),
            "POST",
            &format!("/posts/{}/like", post_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(json_body(response).await["liked"], true);
        assert!(
            state
                .db
                .list_notifications(&alice_id.to_string(), 50)
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn commenting_on_a_missing_post_is_404() {
        let state = test_state();
        let (_, token) = seed_session(&state, "alice");

        let response = request(
            state,
            "POST",
            &format!("/posts/{}/comments", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "content": "nice" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn comment_notification_references_post_and_comment() {
        let state = test_state();
        let (bob_id, _) = seed_session(&state, "bob");
        let (_, alice_token) = seed_session(&state, "alice");

        let post_id = Uuid::new_v4().to_string();
        state
            .db
            .insert_post(&post_id, &bob_id.to_string(), "hello", None)
            .unwrap();

        let response = request(
            state.clone(),
            "POST",
            &format!("/posts/{}/comments", post_id),
            Some(&alice_token),
            Some(json!({ "content": "great post" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let inbox = state.db.list_notifications(&bob_id.to_string(), 50).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, "comment");
        assert_eq!(inbox[0].comment_content.as_deref(), Some("great post"));
    }
}
