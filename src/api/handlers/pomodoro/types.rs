//! Request/response types for pomodoro APIs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::handlers::ApiError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePomodoroRequest {
    pub title: String,
    pub description: Option<String>,
    /// Minutes, default 25.
    pub duration: Option<i32>,
    /// Minutes, default 5.
    pub break_duration: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePomodoroRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub break_duration: Option<i32>,
    pub is_active: Option<bool>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PomodoroResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub break_duration: i32,
    pub is_active: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PomodoroListQuery {
    pub skip: Option<i64>,
    /// Default 100.
    pub limit: Option<i64>,
    /// Only active sessions (default true).
    pub active_only: Option<bool>,
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    /// `created_at`, `updated_at`, `title` or `duration`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

/// Whitelisted sort columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PomodoroSortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Duration,
}

impl PomodoroSortBy {
    pub(crate) fn from_param(value: Option<&str>) -> Result<Self, ApiError> {
        match value.map(str::trim) {
            None | Some("" | "created_at") => Ok(Self::CreatedAt),
            Some("updated_at") => Ok(Self::UpdatedAt),
            Some("title") => Ok(Self::Title),
            Some("duration") => Ok(Self::Duration),
            Some(_) => Err(ApiError::bad_request(
                "sort_by must be one of created_at, updated_at, title, duration",
            )),
        }
    }

    pub(crate) const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Duration => "duration",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Window length in days, 1..=365 (default 30).
    pub days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PomodoroAnalytics {
    pub total_sessions: i64,
    pub completed_sessions: i64,
    /// Percent, two decimals.
    pub completion_rate: f64,
    /// Minutes, two decimals.
    pub average_duration: f64,
    /// Minutes.
    pub total_time: i64,
}
