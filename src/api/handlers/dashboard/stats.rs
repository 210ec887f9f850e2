//! `GET /v1/dashboard/stats`.
//!
//! Todo counts honour the date range and the optional category/priority
//! filters. The productivity trend covers the 7 days ending at `end_date` and
//! the heatmap the 30 days ending there, independent of `start_date`.

use axum::{
    Json,
    extract::{Extension, Query},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::{Days, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

use super::storage::{
    EntryCounts, HabitCounts, TodoCounts, category_distribution, entry_counts, habit_counts,
    habits_completed_by_day, heatmap_entries, priority_distribution, todo_counts,
    todos_completed_by_day,
};
use super::types::{DashboardQuery, DashboardStats, HabitStats, ProductivityPoint, TodoStats};
use crate::api::handlers::auth::{AuthState, principal::require_auth};
use crate::api::handlers::{ApiError, percentage, round2};

const DEFAULT_RANGE_DAYS: u64 = 30;
const TREND_DAYS: u64 = 7;
const HEATMAP_DAYS: u64 = 30;

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}

/// Resolve the reporting range; `end` defaults to `today`, `start` to 30 days
/// before `end`.
pub(super) fn stats_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or_else(|| days_before(end, DEFAULT_RANGE_DAYS));
    if start > end {
        return Err(ApiError::bad_request("start_date must not be after end_date"));
    }
    Ok((start, end))
}

/// Seven consecutive days ending at `end`, zero-filled.
pub(super) fn productivity_trend(
    end: NaiveDate,
    todos: &HashMap<NaiveDate, i64>,
    habits: &HashMap<NaiveDate, i64>,
) -> Vec<ProductivityPoint> {
    (0..TREND_DAYS)
        .rev()
        .map(|offset| {
            let date = days_before(end, offset);
            ProductivityPoint {
                date,
                todos_completed: todos.get(&date).copied().unwrap_or(0),
                habits_completed: habits.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn todo_stats(counts: TodoCounts) -> TodoStats {
    TodoStats {
        total: counts.total,
        completed: counts.completed,
        pending: counts.total - counts.completed,
        completion_rate: percentage(counts.completed, counts.total),
    }
}

fn habit_stats(habits: HabitCounts, entries: EntryCounts) -> HabitStats {
    HabitStats {
        total: habits.total,
        active: habits.active,
        completion_rate: percentage(entries.completed, entries.total),
        average_streak: round2(habits.average_streak),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[utoipa::path(
    get,
    path = "/v1/dashboard/stats",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "dashboard"
)]
pub async fn dashboard_stats(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let (start, end) = stats_range(query.start_date, query.end_date, Utc::now().date_naive())?;

    let todos = todo_counts(
        &pool,
        user.id,
        start,
        end,
        non_blank(query.category.as_deref()),
        non_blank(query.priority.as_deref()),
    )
    .await?;
    let habits = habit_counts(&pool, user.id).await?;
    let entries = entry_counts(&pool, user.id, start, end).await?;

    let trend_start = days_before(end, TREND_DAYS - 1);
    let todos_by_day = todos_completed_by_day(&pool, user.id, trend_start, end).await?;
    let habits_by_day = habits_completed_by_day(&pool, user.id, trend_start, end).await?;

    let habit_heatmap = heatmap_entries(
        &pool,
        user.id,
        days_before(end, HEATMAP_DAYS - 1),
        end,
    )
    .await?;

    Ok(Json(DashboardStats {
        todo_stats: todo_stats(todos),
        habit_stats: habit_stats(habits, entries),
        productivity_trend: productivity_trend(end, &todos_by_day, &habits_by_day),
        category_distribution: category_distribution(&pool, user.id).await?,
        priority_distribution: priority_distribution(&pool, user.id).await?,
        habit_heatmap,
    }))
}
