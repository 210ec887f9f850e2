//! Read-only listings of every user's todos and habits.

use axum::{
    Json,
    extract::{Extension, Query},
    http::HeaderMap,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::DEFAULT_ADMIN_LIMIT;
use super::storage::{HabitFilter, Listing, TodoFilter, fetch_all_habits, fetch_all_todos};
use super::types::{
    AdminHabitQuery, AdminTodoQuery, HABIT_SORT_COLUMNS, TODO_SORT_COLUMNS, sort_column,
};
use crate::api::handlers::auth::{AuthState, principal::require_admin};
use crate::api::handlers::habits::types::HabitResponse;
use crate::api::handlers::todos::types::TodoResponse;
use crate::api::handlers::{ApiError, Pagination, SortOrder};

fn listing(
    skip: Option<i64>,
    limit: Option<i64>,
    sort_by: Option<&str>,
    sort_order: Option<&str>,
    allowed: &'static [&'static str],
) -> Result<Listing, ApiError> {
    let (skip, limit) = Pagination { skip, limit }.bounds(DEFAULT_ADMIN_LIMIT);
    Ok(Listing {
        sort_column: sort_column(sort_by, allowed)?,
        sort_order: SortOrder::from_param(sort_order)?,
        skip,
        limit,
    })
}

#[utoipa::path(
    get,
    path = "/v1/admin/todos",
    params(AdminTodoQuery),
    responses(
        (status = 200, description = "Todos across all users", body = [TodoResponse]),
        (status = 400, description = "Invalid sort parameters"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_all_todos(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<AdminTodoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &pool, &auth_state).await?;

    let listing = listing(
        query.skip,
        query.limit,
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
        TODO_SORT_COLUMNS,
    )?;
    let filter = TodoFilter {
        is_completed: query.is_completed,
        priority: query.priority,
        category: query.category,
        owner_id: query.user_id,
        search: query.search,
    };

    Ok(Json(fetch_all_todos(&pool, &filter, listing).await?))
}

#[utoipa::path(
    get,
    path = "/v1/admin/habits",
    params(AdminHabitQuery),
    responses(
        (status = 200, description = "Habits across all users", body = [HabitResponse]),
        (status = 400, description = "Invalid sort parameters"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_all_habits(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<AdminHabitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &pool, &auth_state).await?;

    let listing = listing(
        query.skip,
        query.limit,
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
        HABIT_SORT_COLUMNS,
    )?;
    let filter = HabitFilter {
        is_active: query.is_active,
        frequency: query.frequency,
        owner_id: query.user_id,
        search: query.search,
    };

    Ok(Json(fetch_all_habits(&pool, &filter, listing).await?))
}
