//! User management.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::storage::{
    Listing, UserFilter, fetch_user, fetch_users, remove_user, update_user_flags,
};
use super::types::{AdminUserQuery, AdminUserUpdate, USER_SORT_COLUMNS, sort_column};
use super::{DEFAULT_ADMIN_LIMIT, USER_NOT_FOUND};
use crate::api::handlers::auth::types::UserResponse;
use crate::api::handlers::auth::{AuthState, principal::require_admin};
use crate::api::handlers::{ApiError, Pagination, SortOrder};

#[utoipa::path(
    get,
    path = "/v1/admin/users",
    params(AdminUserQuery),
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 400, description = "Invalid sort parameters"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_users(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<AdminUserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &pool, &auth_state).await?;

    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .bounds(DEFAULT_ADMIN_LIMIT);
    let listing = Listing {
        sort_column: sort_column(query.sort_by.as_deref(), USER_SORT_COLUMNS)?,
        sort_order: SortOrder::from_param(query.sort_order.as_deref())?,
        skip,
        limit,
    };
    let filter = UserFilter {
        is_active: query.is_active,
        is_admin: query.is_admin,
        is_verified: query.is_verified,
        search: query.search,
    };

    let users = fetch_users(&pool, &filter, listing).await?;
    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/admin/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn get_user(
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &pool, &auth_state).await?;
    let user = fetch_user(&pool, user_id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    Ok(Json(UserResponse::from(user)))
}

/// Toggle `is_active`, `is_admin` or `is_verified`.
#[utoipa::path(
    put,
    path = "/v1/admin/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = AdminUserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn put_user(
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<AdminUserUpdate>>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_admin(&headers, &pool, &auth_state).await?;
    let Some(Json(update)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let user = update_user_flags(&pool, user_id, &update)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    info!(admin_id = %admin.id, user_id = %user.id, "User flags updated");
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/v1/admin/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete yourself"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn delete_user(
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_admin(&headers, &pool, &auth_state).await?;
    if admin.id == user_id {
        return Err(ApiError::bad_request("Cannot delete yourself"));
    }

    if remove_user(&pool, user_id).await? {
        info!(admin_id = %admin.id, user_id = %user_id, "User deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(USER_NOT_FOUND))
    }
}
