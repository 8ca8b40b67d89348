use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use agora_db::Database;
use agora_feed::feed::ChangeFeed;
use agora_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub feed: ChangeFeed,
    /// Seconds within which repeat views of the same post collapse into one
    /// recorded row. Zero disables coalescing.
    pub view_coalesce_secs: u64,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation(
            "username must be 3-32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::Conflict("username is already taken".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Store(anyhow::anyhow!("password hash failure: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();

    state.db.create_user(
        &user_id.to_string(),
        &req.username,
        &password_hash,
        req.full_name.as_deref(),
    )?;

    let token = create_token(&state.jwt_secret, user_id, &req.username)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .get_user_by_username(&req.username)?
        .ok_or(ApiError::Unauthenticated)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Store(anyhow::anyhow!("stored hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthenticated)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Store(anyhow::anyhow!("corrupt user id '{}': {e}", user.id)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

pub(crate) fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_util::{json_body, request, test_state};

    #[tokio::test]
    async fn register_issues_a_working_token() {
        let state = test_state();

        let response = request(
            state.clone(),
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "correct horse", "full_name": null })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let token = body["token"].as_str().unwrap().to_string();
        assert!(body["user_id"].is_string());

        // The fresh token passes the session guard.
        let response = request(state, "GET", "/notifications", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn taken_username_is_a_conflict() {
        let state = test_state();

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let response = request(
                state.clone(),
                "POST",
                "/auth/register",
                None,
                Some(json!({ "username": "alice", "password": "correct horse", "full_name": null })),
            )
            .await;
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn register_validates_username_and_password() {
        let state = test_state();

        let response = request(
            state.clone(),
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "ab", "password": "correct horse", "full_name": null })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = request(
            state,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "short", "full_name": null })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_verifies_the_stored_hash() {
        let state = test_state();

        request(
            state.clone(),
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "correct horse", "full_name": null })),
        )
        .await;

        let response = request(
            state.clone(),
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "correct horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["username"], "alice");
        assert!(body["token"].is_string());

        let response = request(
            state.clone(),
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = request(
            state,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "correct horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
