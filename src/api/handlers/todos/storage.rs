//! SQL helpers for todos.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{Priority, TodoResponse, UpdateTodoRequest};

pub(crate) const TODO_COLUMNS: &str = "id, owner_id, title, description, is_completed, priority, \
     category, due_date, created_at, updated_at, completed_at";

pub(crate) fn todo_from_row(row: &PgRow) -> TodoResponse {
    TodoResponse {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        is_completed: row.get("is_completed"),
        priority: row.get("priority"),
        category: row.get("category"),
        due_date: row.get("due_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        completed_at: row.get("completed_at"),
    }
}

/// `completed_at` after an update: stamped on false→true, cleared on
/// true→false, otherwise unchanged.
pub(super) fn next_completed_at(
    was_completed: bool,
    is_completed: Option<bool>,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (was_completed, is_completed) {
        (false, Some(true)) => Some(now),
        (true, Some(false)) => None,
        _ => completed_at,
    }
}

pub(super) struct NewTodo<'a> {
    pub(super) title: &'a str,
    pub(super) description: Option<&'a str>,
    pub(super) priority: Priority,
    pub(super) category: Option<&'a str>,
    pub(super) due_date: Option<DateTime<Utc>>,
}

pub(super) async fn insert_todo(
    pool: &PgPool,
    owner_id: Uuid,
    todo: &NewTodo<'_>,
) -> Result<TodoResponse, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO todos (owner_id, title, description, priority, category, due_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {TODO_COLUMNS}
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
        .bind(todo.title)
        .bind(todo.description)
        .bind(todo.priority.as_str())
        .bind(todo.category)
        .bind(todo.due_date)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    Ok(todo_from_row(&row))
}

pub(super) async fn fetch_todos(
    pool: &PgPool,
    owner_id: Uuid,
    completed: Option<bool>,
    skip: i64,
    limit: i64,
) -> Result<Vec<TodoResponse>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {TODO_COLUMNS}
        FROM todos
        WHERE owner_id = $1
          AND ($2::boolean IS NULL OR is_completed = $2)
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
        .bind(completed)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows.iter().map(todo_from_row).collect())
}

pub(super) async fn fetch_todo(
    pool: &PgPool,
    owner_id: Uuid,
    todo_id: Uuid,
) -> Result<Option<TodoResponse>, sqlx::Error> {
    let query = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND owner_id = $2");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(todo_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(todo_from_row))
}

/// Apply a partial update, maintaining `completed_at`.
pub(super) async fn update_todo(
    pool: &PgPool,
    owner_id: Uuid,
    todo_id: Uuid,
    update: &UpdateTodoRequest,
) -> Result<Option<TodoResponse>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let query = r"
        SELECT is_completed, completed_at
        FROM todos
        WHERE id = $1 AND owner_id = $2
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let Some(current) = sqlx::query(query)
        .bind(todo_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await?
    else {
        return Ok(None);
    };

    let completed_at = next_completed_at(
        current.get("is_completed"),
        update.is_completed,
        current.get("completed_at"),
        Utc::now(),
    );

    let query = format!(
        r"
        UPDATE todos
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            is_completed = COALESCE($4, is_completed),
            priority = COALESCE($5, priority),
            category = COALESCE($6, category),
            due_date = COALESCE($7, due_date),
            completed_at = $8,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {TODO_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(todo_id)
        .bind(update.title.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.is_completed)
        .bind(update.priority.map(Priority::as_str))
        .bind(update.category.as_deref())
        .bind(update.due_date)
        .bind(completed_at)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await?;

    tx.commit().await?;
    Ok(Some(todo_from_row(&row)))
}

pub(super) async fn remove_todo(
    pool: &PgPool,
    owner_id: Uuid,
    todo_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM todos WHERE id = $1 AND owner_id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(todo_id)
        .bind(owner_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}
