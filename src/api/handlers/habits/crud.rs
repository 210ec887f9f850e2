//! Create, list, read, update and delete habits.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::HABIT_NOT_FOUND;
use super::storage::{
    NewHabit, fetch_habit, fetch_habits, insert_habit, remove_habit, update_habit,
};
use super::types::{CreateHabitRequest, HabitListQuery, HabitResponse, UpdateHabitRequest};
use crate::api::handlers::auth::{AuthState, principal::require_auth};
use crate::api::handlers::{ApiError, Pagination};

fn validate_target_count(target_count: Option<i32>) -> Result<(), ApiError> {
    match target_count {
        Some(count) if count < 1 => Err(ApiError::bad_request("target_count must be at least 1")),
        _ => Ok(()),
    }
}

#[utoipa::path(
    post,
    path = "/v1/habits",
    request_body = CreateHabitRequest,
    responses(
        (status = 201, description = "Habit created", body = HabitResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "habits"
)]
pub async fn create_habit(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateHabitRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Habit name is required"));
    }
    validate_target_count(request.target_count)?;

    let habit = insert_habit(
        &pool,
        user.id,
        &NewHabit {
            name,
            description: request.description.as_deref(),
            frequency: request.frequency,
            target_count: request.target_count.unwrap_or(1),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(habit)))
}

#[utoipa::path(
    get,
    path = "/v1/habits",
    params(HabitListQuery),
    responses(
        (status = 200, description = "Habits of the current user", body = [HabitResponse]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "habits"
)]
pub async fn list_habits(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<HabitListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .default_bounds();

    let habits = fetch_habits(
        &pool,
        user.id,
        query.active_only.unwrap_or(true),
        skip,
        limit,
    )
    .await?;
    Ok(Json(habits))
}

#[utoipa::path(
    get,
    path = "/v1/habits/{habit_id}",
    params(("habit_id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "Habit", body = HabitResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Habit not found")
    ),
    security(("bearer" = [])),
    tag = "habits"
)]
pub async fn get_habit(
    Path(habit_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let habit = fetch_habit(&pool, user.id, habit_id)
        .await?
        .ok_or(ApiError::NotFound(HABIT_NOT_FOUND))?;
    Ok(Json(habit))
}

#[utoipa::path(
    put,
    path = "/v1/habits/{habit_id}",
    params(("habit_id" = Uuid, Path, description = "Habit id")),
    request_body = UpdateHabitRequest,
    responses(
        (status = 200, description = "Habit updated", body = HabitResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Habit not found")
    ),
    security(("bearer" = [])),
    tag = "habits"
)]
pub async fn put_habit(
    Path(habit_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateHabitRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    if request
        .name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(ApiError::bad_request("Habit name cannot be empty"));
    }
    validate_target_count(request.target_count)?;

    let habit = update_habit(&pool, user.id, habit_id, &request)
        .await?
        .ok_or(ApiError::NotFound(HABIT_NOT_FOUND))?;
    Ok(Json(habit))
}

#[utoipa::path(
    delete,
    path = "/v1/habits/{habit_id}",
    params(("habit_id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 204, description = "Habit deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Habit not found")
    ),
    security(("bearer" = [])),
    tag = "habits"
)]
pub async fn delete_habit(
    Path(habit_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    if remove_habit(&pool, user.id, habit_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(HABIT_NOT_FOUND))
    }
}
