//! Request/response types for admin APIs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::handlers::ApiError;

pub(super) const USER_SORT_COLUMNS: &[&str] = &["created_at", "email", "username", "full_name"];
pub(super) const TODO_SORT_COLUMNS: &[&str] =
    &["created_at", "updated_at", "title", "priority", "due_date"];
pub(super) const HABIT_SORT_COLUMNS: &[&str] = &[
    "created_at",
    "updated_at",
    "name",
    "streak_count",
    "best_streak",
];

/// Resolve `sort_by` against a whitelist; absent picks the first column.
pub(super) fn sort_column(
    value: Option<&str>,
    allowed: &'static [&'static str],
) -> Result<&'static str, ApiError> {
    let requested = value.map(str::trim).filter(|value| !value.is_empty());
    match requested {
        None => allowed
            .first()
            .copied()
            .ok_or_else(|| ApiError::bad_request("sort_by is not supported")),
        Some(requested) => allowed
            .iter()
            .copied()
            .find(|column| *column == requested)
            .ok_or_else(|| {
                ApiError::bad_request(format!("sort_by must be one of {}", allowed.join(", ")))
            }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCounts {
    pub total_users: i64,
    pub active_users: i64,
    pub admin_users: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TodoCounts {
    pub total_todos: i64,
    pub completed_todos: i64,
    pub pending_todos: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HabitCounts {
    pub total_habits: i64,
    pub active_habits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboardStats {
    pub user_stats: UserCounts,
    pub todo_stats: TodoCounts,
    pub habit_stats: HabitCounts,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdminUserUpdate {
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminUserQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_verified: Option<bool>,
    /// Matches email, username or full name.
    pub search: Option<String>,
    /// `created_at`, `email`, `username` or `full_name`.
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminTodoQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub is_completed: Option<bool>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub user_id: Option<Uuid>,
    /// Matches title or description.
    pub search: Option<String>,
    /// `created_at`, `updated_at`, `title`, `priority` or `due_date`.
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminHabitQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub is_active: Option<bool>,
    pub frequency: Option<String>,
    pub user_id: Option<Uuid>,
    /// Matches name or description.
    pub search: Option<String>,
    /// `created_at`, `updated_at`, `name`, `streak_count` or `best_streak`.
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}
