//! SQL helpers for pomodoro sessions.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{PomodoroResponse, PomodoroSortBy, UpdatePomodoroRequest};
use crate::api::handlers::{SortOrder, like_pattern};

const SESSION_COLUMNS: &str = "id, owner_id, title, description, duration, break_duration, \
     is_active, completed_at, created_at, updated_at";

fn session_from_row(row: &PgRow) -> PomodoroResponse {
    PomodoroResponse {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        duration: row.get("duration"),
        break_duration: row.get("break_duration"),
        is_active: row.get("is_active"),
        completed_at: row.get("completed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) struct NewSession<'a> {
    pub(super) title: &'a str,
    pub(super) description: Option<&'a str>,
    pub(super) duration: i32,
    pub(super) break_duration: i32,
}

/// Filters for listing sessions; dates compare against `created_at::date`.
#[derive(Debug, Default)]
pub(super) struct SessionFilter {
    pub(super) active_only: bool,
    pub(super) search: Option<String>,
    pub(super) created_from: Option<NaiveDate>,
    pub(super) created_to: Option<NaiveDate>,
    pub(super) sort_by: PomodoroSortBy,
    pub(super) sort_order: SortOrder,
    pub(super) skip: i64,
    pub(super) limit: i64,
}

/// Raw aggregates for the analytics window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct SessionTotals {
    pub(super) total: i64,
    pub(super) completed: i64,
    pub(super) minutes: i64,
}

pub(super) async fn insert_session(
    pool: &PgPool,
    owner_id: Uuid,
    session: &NewSession<'_>,
) -> Result<PomodoroResponse, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO pomodoro_sessions (owner_id, title, description, duration, break_duration)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SESSION_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(owner_id)
        .bind(session.title)
        .bind(session.description)
        .bind(session.duration)
        .bind(session.break_duration)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    Ok(session_from_row(&row))
}

fn list_query(owner_id: Uuid, filter: &SessionFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions WHERE owner_id = "
    ));
    builder.push_bind(owner_id);

    if filter.active_only {
        builder.push(" AND is_active");
    }
    if let Some(search) = filter.search.as_deref().filter(|term| !term.trim().is_empty()) {
        builder
            .push(" AND (title || ' ' || COALESCE(description, '')) ILIKE ")
            .push_bind(like_pattern(search));
    }
    if let Some(from) = filter.created_from {
        builder.push(" AND created_at::date >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        builder.push(" AND created_at::date <= ").push_bind(to);
    }

    // Column and direction come from whitelists, never from raw input.
    builder
        .push(" ORDER BY ")
        .push(filter.sort_by.column())
        .push(" ")
        .push(filter.sort_order.as_sql())
        .push(", id")
        .push(" OFFSET ")
        .push_bind(filter.skip)
        .push(" LIMIT ")
        .push_bind(filter.limit);
    builder
}

pub(super) async fn fetch_sessions(
    pool: &PgPool,
    owner_id: Uuid,
    filter: &SessionFilter,
) -> Result<Vec<PomodoroResponse>, sqlx::Error> {
    let mut builder = list_query(owner_id, filter);
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = builder.sql()
    );
    let rows = builder
        .build()
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows.iter().map(session_from_row).collect())
}

pub(super) async fn fetch_session(
    pool: &PgPool,
    owner_id: Uuid,
    session_id: Uuid,
) -> Result<Option<PomodoroResponse>, sqlx::Error> {
    let query =
        format!("SELECT {SESSION_COLUMNS} FROM pomodoro_sessions WHERE id = $1 AND owner_id = $2");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(session_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(session_from_row))
}

pub(super) async fn update_session(
    pool: &PgPool,
    owner_id: Uuid,
    session_id: Uuid,
    update: &UpdatePomodoroRequest,
) -> Result<Option<PomodoroResponse>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE pomodoro_sessions
        SET title = COALESCE($3, title),
            description = COALESCE($4, description),
            duration = COALESCE($5, duration),
            break_duration = COALESCE($6, break_duration),
            is_active = COALESCE($7, is_active),
            completed_at = COALESCE($8, completed_at),
            updated_at = NOW()
        WHERE id = $1 AND owner_id = $2
        RETURNING {SESSION_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(session_id)
        .bind(owner_id)
        .bind(update.title.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.duration)
        .bind(update.break_duration)
        .bind(update.is_active)
        .bind(update.completed_at)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(session_from_row))
}

pub(super) async fn remove_session(
    pool: &PgPool,
    owner_id: Uuid,
    session_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM pomodoro_sessions WHERE id = $1 AND owner_id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(session_id)
        .bind(owner_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count, completed count and total minutes of sessions created in
/// `[start, end]` (inclusive dates).
pub(super) async fn session_totals(
    pool: &PgPool,
    owner_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<SessionTotals, sqlx::Error> {
    let query = r"
        SELECT COUNT(*) AS total,
               COUNT(completed_at) AS completed,
               COALESCE(SUM(duration), 0)::BIGINT AS minutes
        FROM pomodoro_sessions
        WHERE owner_id = $1
          AND created_at::date >= $2
          AND created_at::date <= $3
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    Ok(SessionTotals {
        total: row.get("total"),
        completed: row.get("completed"),
        minutes: row.get("minutes"),
    })
}
