//! Account registration.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use tracing::info;

use super::password::{hash_password, validate_password};
use super::storage::{NewUser, RegisterOutcome, insert_user};
use super::types::{RegisterRequest, UserResponse};
use super::utils::{normalize_email, valid_email};
use crate::api::handlers::ApiError;

/// Create an account. The password is optional for accounts that only sign
/// in with email codes or Google.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email or username already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let username = request
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let full_name = request
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let password_hash = match request.password {
        Some(password) => {
            validate_password(&password).map_err(ApiError::BadRequest)?;
            Some(hash_password(password).await?)
        }
        None => None,
    };

    let outcome = insert_user(
        &pool,
        NewUser {
            email: &email,
            username,
            full_name,
            password_hash: password_hash.as_deref(),
        },
    )
    .await?;

    match outcome {
        RegisterOutcome::Created(user) => {
            info!(user_id = %user.id, "User registered");
            Ok((StatusCode::CREATED, Json(UserResponse::from(*user))))
        }
        RegisterOutcome::EmailTaken => {
            Err(ApiError::Conflict("Email already registered".to_string()))
        }
        RegisterOutcome::UsernameTaken => {
            Err(ApiError::Conflict("Username already taken".to_string()))
        }
    }
}
