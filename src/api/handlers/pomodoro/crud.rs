//! Create, list, read, update and delete pomodoro sessions.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::storage::{
    NewSession, SessionFilter, fetch_session, fetch_sessions, insert_session, remove_session,
    update_session,
};
use super::types::{
    CreatePomodoroRequest, PomodoroListQuery, PomodoroResponse, PomodoroSortBy,
    UpdatePomodoroRequest,
};
use super::{DEFAULT_SESSION_LIMIT, SESSION_NOT_FOUND};
use crate::api::handlers::auth::{AuthState, principal::require_auth, types::MessageResponse};
use crate::api::handlers::{ApiError, Pagination, SortOrder};

fn validate_minutes(duration: Option<i32>, break_duration: Option<i32>) -> Result<(), ApiError> {
    if duration.is_some_and(|minutes| minutes < 1) {
        return Err(ApiError::bad_request("duration must be at least 1 minute"));
    }
    if break_duration.is_some_and(|minutes| minutes < 0) {
        return Err(ApiError::bad_request("break_duration cannot be negative"));
    }
    Ok(())
}

fn session_filter(query: PomodoroListQuery) -> Result<SessionFilter, ApiError> {
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .bounds(DEFAULT_SESSION_LIMIT);

    Ok(SessionFilter {
        active_only: query.active_only.unwrap_or(true),
        sort_by: PomodoroSortBy::from_param(query.sort_by.as_deref())?,
        sort_order: SortOrder::from_param(query.sort_order.as_deref())?,
        search: query.search,
        created_from: query.created_from,
        created_to: query.created_to,
        skip,
        limit,
    })
}

#[utoipa::path(
    post,
    path = "/v1/pomodoro",
    request_body = CreatePomodoroRequest,
    responses(
        (status = 201, description = "Session created", body = PomodoroResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "pomodoro"
)]
pub async fn create_session(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreatePomodoroRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Session title is required"));
    }
    validate_minutes(request.duration, request.break_duration)?;

    let session = insert_session(
        &pool,
        user.id,
        &NewSession {
            title,
            description: request.description.as_deref(),
            duration: request.duration.unwrap_or(25),
            break_duration: request.break_duration.unwrap_or(5),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/v1/pomodoro",
    params(PomodoroListQuery),
    responses(
        (status = 200, description = "Sessions of the current user", body = [PomodoroResponse]),
        (status = 400, description = "Invalid sort parameters"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "pomodoro"
)]
pub async fn list_sessions(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<PomodoroListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let filter = session_filter(query)?;
    let sessions = fetch_sessions(&pool, user.id, &filter).await?;
    Ok(Json(sessions))
}

#[utoipa::path(
    get,
    path = "/v1/pomodoro/{session_id}",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session", body = PomodoroResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Pomodoro session not found")
    ),
    security(("bearer" = [])),
    tag = "pomodoro"
)]
pub async fn get_session(
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let session = fetch_session(&pool, user.id, session_id)
        .await?
        .ok_or(ApiError::NotFound(SESSION_NOT_FOUND))?;
    Ok(Json(session))
}

#[utoipa::path(
    put,
    path = "/v1/pomodoro/{session_id}",
    params(("session_id" = Uuid, Path, description = "Session id")),
    request_body = UpdatePomodoroRequest,
    responses(
        (status = 200, description = "Session updated", body = PomodoroResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Pomodoro session not found")
    ),
    security(("bearer" = [])),
    tag = "pomodoro"
)]
pub async fn put_session(
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdatePomodoroRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    if request
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(ApiError::bad_request("Session title cannot be empty"));
    }
    validate_minutes(request.duration, request.break_duration)?;

    let session = update_session(&pool, user.id, session_id, &request)
        .await?
        .ok_or(ApiError::NotFound(SESSION_NOT_FOUND))?;
    Ok(Json(session))
}

#[utoipa::path(
    delete,
    path = "/v1/pomodoro/{session_id}",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Pomodoro session not found")
    ),
    security(("bearer" = [])),
    tag = "pomodoro"
)]
pub async fn delete_session(
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    if remove_session(&pool, user.id, session_id).await? {
        Ok(Json(MessageResponse::new(
            "Pomodoro session deleted successfully",
        )))
    } else {
        Err(ApiError::NotFound(SESSION_NOT_FOUND))
    }
}
