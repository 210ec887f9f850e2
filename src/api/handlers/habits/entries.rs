//! Daily habit entries.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::HABIT_NOT_FOUND;
use super::storage::{AddEntryOutcome, NewEntry, add_entry, fetch_entries};
use super::types::{CreateEntryRequest, EntryResponse};
use crate::api::handlers::auth::{AuthState, principal::require_auth};
use crate::api::handlers::{ApiError, Pagination};

/// Log an entry for a day (today by default) and refresh the streak.
#[utoipa::path(
    post,
    path = "/v1/habits/{habit_id}/entries",
    params(("habit_id" = Uuid, Path, description = "Habit id")),
    request_body = CreateEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Entry for the date already exists, or date in the future"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Habit not found")
    ),
    security(("bearer" = [])),
    tag = "habits"
)]
pub async fn create_entry(
    Path(habit_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateEntryRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let completed_count = request.completed_count.unwrap_or(1);
    if completed_count < 0 {
        return Err(ApiError::bad_request("completed_count cannot be negative"));
    }

    let today = Utc::now().date_naive();
    let entry_date = request.date.unwrap_or(today);
    if entry_date > today {
        return Err(ApiError::bad_request("Entry date cannot be in the future"));
    }

    let outcome = add_entry(
        &pool,
        user.id,
        habit_id,
        &NewEntry {
            entry_date,
            completed_count,
            notes: request.notes.as_deref(),
        },
        today,
    )
    .await?;

    match outcome {
        AddEntryOutcome::Created(entry) => {
            debug!(habit_id = %habit_id, entry_date = %entry.entry_date, "Habit entry logged");
            Ok((StatusCode::CREATED, Json(entry)))
        }
        AddEntryOutcome::HabitNotFound => Err(ApiError::NotFound(HABIT_NOT_FOUND)),
        AddEntryOutcome::Duplicate => Err(ApiError::bad_request(format!(
            "Entry for {entry_date} already exists"
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/v1/habits/{habit_id}/entries",
    params(
        ("habit_id" = Uuid, Path, description = "Habit id"),
        Pagination
    ),
    responses(
        (status = 200, description = "Entries, most recent first", body = [EntryResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Habit not found")
    ),
    security(("bearer" = [])),
    tag = "habits"
)]
pub async fn list_entries(
    Path(habit_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let (skip, limit) = page.default_bounds();
    let entries = fetch_entries(&pool, user.id, habit_id, skip, limit)
        .await?
        .ok_or(ApiError::NotFound(HABIT_NOT_FOUND))?;
    Ok(Json(entries))
}
