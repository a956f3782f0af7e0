use axum::{extract::State, response::Json};
use tracing::{error, info, instrument};

use super::JsonBody;
use crate::error::{AppError, AppResult};
use crate::models::{Credentials, MessageResponse, User};
use crate::state::AppState;
use crate::store::StoreError;

const EMAIL_EXISTS: &str = "Email already exists";

/// Passwords are stored as received.
#[utoipa::path(
    post,
    path = "/register",
    request_body = User,
    responses(
        (status = 200, description = "User registered", body = MessageResponse),
        (status = 400, description = "Email already exists or malformed body")
    ),
    tag = "Auth"
)]
#[instrument(name = "handler::register", skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<User>,
) -> AppResult<Json<MessageResponse>> {
    let email = user.email.clone().unwrap_or_default();
    if state.store.email_taken(&email).await? {
        return Err(AppError::BadRequest(EMAIL_EXISTS.to_string()));
    }

    let user = User { id: None, ..user }.with_default_role();
    match state.store.insert_user(&user).await {
        Ok(id) => {
            info!("Registered user {} ({})", id, email);
            Ok(Json(MessageResponse::new("Registration successful")))
        }
        Err(StoreError::Duplicate(_)) => Err(AppError::BadRequest(EMAIL_EXISTS.to_string())),
        Err(e) => {
            error!("Failed to register {}: {}", email, e);
            Err(AppError::InternalError("Failed to register".to_string()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Matching user, password omitted", body = User),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "handler::login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> AppResult<Json<User>> {
    let found = state
        .store
        .find_user_by_credentials(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            error!("Login lookup failed: {}", e);
            AppError::InternalError("Server error".to_string())
        })?;

    match found {
        Some(user) => {
            info!("User logged in");
            Ok(Json(user.without_password()))
        }
        None => Err(AppError::Unauthorized("Invalid credentials".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_twice_with_same_email() {
        let app = test_app();
        let user = json!({ "name": "Ada", "email": "ada@example.com", "password": "s3cret" });

        let (status, body) = send(&app, "POST", "/register", Some(user.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Registration successful");

        let (status, body) = send(&app, "POST", "/register", Some(user)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already exists");
    }

    #[tokio::test]
    async fn test_second_registration_without_email_is_a_duplicate() {
        let app = test_app();
        let user = json!({ "name": "Anon", "password": "pw" });

        let (status, _) = send(&app, "POST", "/register", Some(user.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", "/register", Some(user)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already exists");
    }

    #[tokio::test]
    async fn test_login_strips_password_and_defaults_role() {
        let app = test_app();
        let user = json!({ "name": "Ada", "email": "ada@example.com", "password": "s3cret" });
        send(&app, "POST", "/register", Some(user)).await;

        let credentials = json!({ "email": "ada@example.com", "password": "s3cret" });
        let (status, body) = send(&app, "POST", "/login", Some(credentials)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["role"], "user");
        assert!(body.get("password").is_none());
        assert_eq!(body["_id"].as_str().map(str::len), Some(24));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = test_app();
        let user = json!({ "email": "ada@example.com", "password": "s3cret" });
        send(&app, "POST", "/register", Some(user)).await;

        let credentials = json!({ "email": "ada@example.com", "password": "guess" });
        let (status, _) = send(&app, "POST", "/login", Some(credentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_keeps_explicit_role() {
        let app = test_app();
        let user = json!({ "email": "root@example.com", "password": "pw", "role": "admin" });
        send(&app, "POST", "/register", Some(user)).await;

        let credentials = json!({ "email": "root@example.com", "password": "pw" });
        let (_, body) = send(&app, "POST", "/login", Some(credentials)).await;
        assert_eq!(body["role"], "admin");
    }
}
