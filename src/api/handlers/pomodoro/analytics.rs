//! Pomodoro analytics over a trailing window of days.

use axum::{
    Json,
    extract::{Extension, Query},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::{Days, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use super::storage::{SessionTotals, session_totals};
use super::types::{AnalyticsQuery, PomodoroAnalytics};
use crate::api::handlers::auth::{AuthState, principal::require_auth};
use crate::api::handlers::{ApiError, percentage, round2};

const DEFAULT_WINDOW_DAYS: u64 = 30;
const MAX_WINDOW_DAYS: u64 = 365;

/// Inclusive `[start, end]` window ending at `today`. Out-of-range values
/// fall back to 30 days.
pub(super) fn analytics_window(days: Option<i64>, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days = days
        .and_then(|days| u64::try_from(days).ok())
        .filter(|days| (1..=MAX_WINDOW_DAYS).contains(days))
        .unwrap_or(DEFAULT_WINDOW_DAYS);
    let start = today.checked_sub_days(Days::new(days - 1)).unwrap_or(today);
    (start, today)
}

pub(super) fn summarize(totals: SessionTotals) -> PomodoroAnalytics {
    let average_duration = if totals.total > 0 {
        #[allow(clippy::cast_precision_loss)]
        round2(totals.minutes as f64 / totals.total as f64)
    } else {
        0.0
    };
    PomodoroAnalytics {
        total_sessions: totals.total,
        completed_sessions: totals.completed,
        completion_rate: percentage(totals.completed, totals.total),
        average_duration,
        total_time: totals.minutes,
    }
}

#[utoipa::path(
    get,
    path = "/v1/pomodoro/analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Session analytics", body = PomodoroAnalytics),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "pomodoro"
)]
pub async fn pomodoro_analytics(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let (start, end) = analytics_window(query.days, Utc::now().date_naive());
    let totals = session_totals(&pool, user.id, start, end).await?;
    Ok(Json(summarize(totals)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn window_defaults_and_clamps() {
        let today = day(2024, 3, 31);
        assert_eq!(analytics_window(None, today), (day(2024, 3, 2), today));
        assert_eq!(analytics_window(Some(0), today), (day(2024, 3, 2), today));
        assert_eq!(analytics_window(Some(-5), today), (day(2024, 3, 2), today));
        assert_eq!(analytics_window(Some(366), today), (day(2024, 3, 2), today));
        assert_eq!(analytics_window(Some(1), today), (today, today));
        assert_eq!(analytics_window(Some(7), today), (day(2024, 3, 25), today));
    }

    #[test]
    fn summarize_empty_window() {
        let analytics = summarize(SessionTotals::default());
        assert_eq!(analytics.total_sessions, 0);
        assert!(analytics.completion_rate.abs() < f64::EPSILON);
        assert!(analytics.average_duration.abs() < f64::EPSILON);
        assert_eq!(analytics.total_time, 0);
    }

    #[test]
    fn summarize_rounds_to_two_decimals() {
        let analytics = summarize(SessionTotals {
            total: 3,
            completed: 2,
            minutes: 80,
        });
        assert!((analytics.completion_rate - 66.67).abs() < f64::EPSILON);
        assert!((analytics.average_duration - 26.67).abs() < f64::EPSILON);
        assert_eq!(analytics.total_time, 80);
    }
}
