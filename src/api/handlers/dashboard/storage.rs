//! Aggregate queries behind the dashboard.

use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, HashMap};
use tracing::Instrument;
use uuid::Uuid;

use super::types::HeatmapPoint;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct TodoCounts {
    pub(super) total: i64,
    pub(super) completed: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct HabitCounts {
    pub(super) total: i64,
    pub(super) active: i64,
    pub(super) average_streak: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct EntryCounts {
    pub(super) total: i64,
    pub(super) completed: i64,
}

pub(super) async fn todo_counts(
    pool: &PgPool,
    owner_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    category: Option<&str>,
    priority: Option<&str>,
) -> Result<TodoCounts, sqlx::Error> {
    let query = r"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE is_completed) AS completed
        FROM todos
        WHERE owner_id = $1
          AND created_at::date >= $2
          AND created_at::date <= $3
          AND ($4::text IS NULL OR category = $4)
          AND ($5::text IS NULL OR priority = $5)
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
        .bind(category)
        .bind(priority)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    Ok(TodoCounts {
        total: row.get("total"),
        completed: row.get("completed"),
    })
}

pub(super) async fn habit_counts(pool: &PgPool, owner_id: Uuid) -> Result<HabitCounts, sqlx::Error> {
    let query = r"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE is_active) AS active,
               COALESCE(AVG(streak_count), 0)::FLOAT8 AS average_streak
        FROM habits
        WHERE owner_id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(owner_id)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    Ok(HabitCounts {
        total: row.get("total"),
        active: row.get("active"),
        average_streak: row.get("average_streak"),
    })
}

pub(super) async fn entry_counts(
    pool: &PgPool,
    owner_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<EntryCounts, sqlx::Error> {
    let query = r"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE e.completed_count > 0) AS completed
        FROM habit_entries e
        JOIN habits h ON h.id = e.habit_id
        WHERE h.owner_id = $1
          AND e.entry_date >= $2
          AND e.entry_date <= $3
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
    Ok(EntryCounts {
        total: row.get("total"),
        completed: row.get("completed"),
    })
}

/// Todos completed per day within `[start, end]`.
pub(super) async fn todos_completed_by_day(
    pool: &PgPool,
    owner_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<NaiveDate, i64>, sqlx::Error> {
    let query = r"
        SELECT completed_at::date AS day, COUNT(*) AS count
        FROM todos
        WHERE owner_id = $1
          AND is_completed
          AND completed_at::date >= $2
          AND completed_at::date <= $3
        GROUP BY day
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get("day"), row.get("count")))
        .collect())
}

/// Habit entries with `completed_count > 0` per day within `[start, end]`.
pub(super) async fn habits_completed_by_day(
    pool: &PgPool,
    owner_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<NaiveDate, i64>, sqlx::Error> {
    let query = r"
        SELECT e.entry_date AS day, COUNT(*) AS count
        FROM habit_entries e
        JOIN habits h ON h.id = e.habit_id
        WHERE h.owner_id = $1
          AND e.completed_count > 0
          AND e.entry_date >= $2
          AND e.entry_date <= $3
        GROUP BY e.entry_date
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get("day"), row.get("count")))
        .collect())
}

/// One point per entry in `[start, end]`, oldest first.
pub(super) async fn heatmap_entries(
    pool: &PgPool,
    owner_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HeatmapPoint>, sqlx::Error> {
    let query = r"
        SELECT e.entry_date, e.completed_count::BIGINT AS completed_count
        FROM habit_entries e
        JOIN habits h ON h.id = e.habit_id
        WHERE h.owner_id = $1
          AND e.entry_date >= $2
          AND e.entry_date <= $3
        ORDER BY e.entry_date
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows
        .iter()
        .map(|row| HeatmapPoint {
            date: row.get("entry_date"),
            completed_count: row.get("completed_count"),
        })
        .collect())
}

pub(super) async fn category_distribution(
    pool: &PgPool,
    owner_id: Uuid,
) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    let query = r"
        SELECT category AS key, COUNT(*) AS count
        FROM todos
        WHERE owner_id = $1 AND category IS NOT NULL
        GROUP BY category
    ";
    distribution(pool, owner_id, query).await
}

pub(super) async fn priority_distribution(
    pool: &PgPool,
    owner_id: Uuid,
) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    let query = r"
        SELECT priority AS key, COUNT(*) AS count
        FROM todos
        WHERE owner_id = $1
        GROUP BY priority
    ";
    distribution(pool, owner_id, query).await
}

async fn distribution(
    pool: &PgPool,
    owner_id: Uuid,
    query: &'static str,
) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(owner_id)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get("key"), row.get("count")))
        .collect())
}
