//! SQL helpers for habits and their daily entries.
//!
//! Every query is scoped by `owner_id`; a habit owned by someone else behaves
//! exactly like a missing one.

use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{EntryResponse, Frequency, HabitResponse, UpdateHabitRequest};
use crate::api::handlers::auth::utils::is_unique_violation;
use crate::streak::{HabitStreak, STREAK_LOOKBACK_ENTRIES};

pub(crate) const HABIT_COLUMNS: &str = "id, owner_id, name, description, frequency, target_count, \
     is_active, streak_count, best_streak, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, habit_id, entry_date, completed_count, notes, created_at";

pub(crate) fn habit_from_row(row: &PgRow) -> HabitResponse {
    HabitResponse {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        frequency: row.get("frequency"),
        target_count: row.get("target_count"),
        is_active: row.get("is_active"),
        streak_count: row.get("streak_count"),
        best_streak: row.get("best_streak"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn entry_from_row(row: &PgRow) -> EntryResponse {
    EntryResponse {
        id: row.get("id"),
        habit_id: row.get("habit_id"),
        entry_date: row.get("entry_date"),
        completed_count: row.get("completed_count"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

pub(super) struct NewHabit<'a> {
    pub(super) name: &'a str,
    pub(super) description: Option<&'a str>,
    pub(super) frequency: Frequency,
    pub(super) target_count: i32,
}

pub(super) struct NewEntry<'a> {
    pub(super) entry_date: NaiveDate,
    pub(super) completed_count: i32,
    pub(super) notes: Option<&'a str>,
}

#[derive(Debug)]
pub(super) enum AddEntryOutcome {
    Created(EntryResponse),
    HabitNotFound,
    Duplicate,
}

pub(super) async fn insert_habit(
    pool: &PgPool,
    owner_id: Uuid,
    habit: &NewHabit<'_>,
) -> Result<HabitResponse, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO habits (owner_id, name, description, frequency, target_count)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {HABIT_COLUMNS}
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
        .bind(habit.name)
        .bind(habit.description)
        .bind(habit.frequency.as_str())
        .bind(habit.target_count)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    Ok(habit_from_row(&row))
}

pub(super) async fn fetch_habits(
    pool: &PgPool,
    owner_id: Uuid,
    active_only: bool,
    skip: i64,
    limit: i64,
) -> Result<Vec<HabitResponse>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {HABIT_COLUMNS}
        FROM habits
        WHERE owner_id = $1
          AND (NOT $2 OR is_active)
        ORDER BY created_at DESC
        OFFSET $3
        LIMIT $4
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(owner_id)
        .bind(active_only)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows.iter().map(habit_from_row).collect())
}

pub(super) async fn fetch_habit(
    pool: &PgPool,
    owner_id: Uuid,
    habit_id: Uuid,
) -> Result<Option<HabitResponse>, sqlx::Error> {
    let query = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1 AND owner_id = $2");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(habit_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(habit_from_row))
}

/// Apply the fields present in `update`; absent fields keep their value.
pub(super) async fn update_habit(
    pool: &PgPool,
    owner_id: Uuid,
    habit_id: Uuid,
    update: &UpdateHabitRequest,
) -> Result<Option<HabitResponse>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE habits
        SET name = COALESCE($3, name),
            description = COALESCE($4, description),
            frequency = COALESCE($5, frequency),
            target_count = COALESCE($6, target_count),
            is_active = COALESCE($7, is_active),
            updated_at = NOW()
        WHERE id = $1 AND owner_id = $2
        RETURNING {HABIT_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(habit_id)
        .bind(owner_id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.frequency.map(Frequency::as_str))
        .bind(update.target_count)
        .bind(update.is_active)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(habit_from_row))
}

/// Delete a habit and, by cascade, its entries. `false` when not found.
pub(super) async fn remove_habit(
    pool: &PgPool,
    owner_id: Uuid,
    habit_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM habits WHERE id = $1 AND owner_id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(habit_id)
        .bind(owner_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert an entry and recompute the habit's streak in the same transaction.
///
/// The habit row is locked first so concurrent entries for the same habit
/// recompute one after another. Returning early drops `tx`, which rolls back.
pub(super) async fn add_entry(
    pool: &PgPool,
    owner_id: Uuid,
    habit_id: Uuid,
    entry: &NewEntry<'_>,
    today: NaiveDate,
) -> Result<AddEntryOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let query = r"
        SELECT streak_count, best_streak
        FROM habits
        WHERE id = $1 AND owner_id = $2
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let Some(row) = sqlx::query(query)
        .bind(habit_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await?
    else {
        return Ok(AddEntryOutcome::HabitNotFound);
    };
    let mut streak = HabitStreak::new(row.get("streak_count"), row.get("best_streak"));

    let query = format!(
        r"
        INSERT INTO habit_entries (habit_id, entry_date, completed_count, notes)
        VALUES ($1, $2, $3, $4)
        RETURNING {ENTRY_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let inserted = sqlx::query(&query)
        .bind(habit_id)
        .bind(entry.entry_date)
        .bind(entry.completed_count)
        .bind(entry.notes)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;
    let created = match inserted {
        Ok(row) => entry_from_row(&row),
        Err(err) if is_unique_violation(&err) => return Ok(AddEntryOutcome::Duplicate),
        Err(err) => return Err(err),
    };

    let query = r"
        SELECT entry_date
        FROM habit_entries
        WHERE habit_id = $1
        ORDER BY entry_date DESC
        LIMIT $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let recent: Vec<NaiveDate> = sqlx::query_scalar(query)
        .bind(habit_id)
        .bind(i64::try_from(STREAK_LOOKBACK_ENTRIES).unwrap_or(i64::MAX))
        .fetch_all(&mut *tx)
        .instrument(span)
        .await?;

    streak.recompute(&recent, today);

    let query = r"
        UPDATE habits
        SET streak_count = $2,
            best_streak = $3,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(habit_id)
        .bind(streak.streak_count)
        .bind(streak.best_streak)
        .execute(&mut *tx)
        .instrument(span)
        .await?;

    tx.commit().await?;
    Ok(AddEntryOutcome::Created(created))
}

/// Entries for an owned habit, most recent first. `None` when the habit is
/// not found.
pub(super) async fn fetch_entries(
    pool: &PgPool,
    owner_id: Uuid,
    habit_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Option<Vec<EntryResponse>>, sqlx::Error> {
    if fetch_habit(pool, owner_id, habit_id).await?.is_none() {
        return Ok(None);
    }

    let query = format!(
        r"
        SELECT {ENTRY_COLUMNS}
        FROM habit_entries
        WHERE habit_id = $1
        ORDER BY entry_date DESC
        OFFSET $2
        LIMIT $3
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(habit_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(Some(rows.iter().map(entry_from_row).collect()))
}
