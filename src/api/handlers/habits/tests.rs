//! Database-backed tests for habit entries and streak persistence.
//!
//! Each test starts a Postgres container with the embedded schema and drives
//! the router end-to-end.

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::post,
};
use chrono::{Days, NaiveDate, Utc};
use serde_json::json;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use super::entries::{create_entry, list_entries};
use super::storage::{AddEntryOutcome, NewEntry, add_entry};
use crate::api::handlers::auth::AuthState;
use crate::api::handlers::test_db::{TestDb, auth_state, bearer, insert_user, json_body};

fn app_router(pool: PgPool, auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route(
            "/v1/habits/{habit_id}/entries",
            post(create_entry).get(list_entries),
        )
        .layer(Extension(pool))
        .layer(Extension(auth_state))
}

async fn insert_habit(pool: &PgPool, owner_id: Uuid) -> Result<Uuid> {
    let habit_id = sqlx::query_scalar("INSERT INTO habits (owner_id, name) VALUES ($1, $2) RETURNING id")
        .bind(owner_id)
        .bind("Read")
        .fetch_one(pool)
        .await
        .context("insert habit")?;
    Ok(habit_id)
}

async fn persisted_streak(pool: &PgPool, habit_id: Uuid) -> Result<(i32, i32)> {
    let row = sqlx::query("SELECT streak_count, best_streak FROM habits WHERE id = $1")
        .bind(habit_id)
        .fetch_one(pool)
        .await
        .context("load streak")?;
    Ok((row.get("streak_count"), row.get("best_streak")))
}

fn days_ago(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(today)
}

async fn post_entry(
    app: &Router,
    token: &str,
    habit_id: Uuid,
    date: NaiveDate,
) -> Result<(StatusCode, serde_json::Value)> {
    let body = json!({ "date": date });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/habits/{habit_id}/entries"))
                .header(CONTENT_TYPE, "application/json")
                .header(AUTHORIZATION, token)
                .body(Body::from(body.to_string()))?,
        )
        .await?;
    let status = response.status();
    Ok((status, json_body(response).await?))
}

#[tokio::test]
async fn gap_resets_persisted_streak() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let state = auth_state()?;
    let owner_id = insert_user(&db.pool, "reader@example.com").await?;
    let habit_id = insert_habit(&db.pool, owner_id).await?;
    let token = bearer(&state, "reader@example.com")?;
    let app = app_router(db.pool.clone(), state);

    let today = Utc::now().date_naive();
    for date in [days_ago(today, 3), days_ago(today, 1), today] {
        let (status, body) = post_entry(&app, &token, habit_id, date).await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["entry_date"], json!(date));
    }

    assert_eq!(persisted_streak(&db.pool, habit_id).await?, (2, 2));
    Ok(())
}

#[tokio::test]
async fn duplicate_date_is_rejected_and_streak_kept() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let state = auth_state()?;
    let owner_id = insert_user(&db.pool, "dup@example.com").await?;
    let habit_id = insert_habit(&db.pool, owner_id).await?;
    let token = bearer(&state, "dup@example.com")?;
    let app = app_router(db.pool.clone(), state);

    let today = Utc::now().date_naive();
    let (status, _) = post_entry(&app, &token, habit_id, today).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_entry(&app, &token, habit_id, today).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], format!("Entry for {today} already exists"));

    let outcome = add_entry(
        &db.pool,
        owner_id,
        habit_id,
        &NewEntry {
            entry_date: today,
            completed_count: 1,
            notes: None,
        },
        today,
    )
    .await?;
    assert!(matches!(outcome, AddEntryOutcome::Duplicate));

    let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habit_entries WHERE habit_id = $1")
        .bind(habit_id)
        .fetch_one(&db.pool)
        .await?;
    assert_eq!(entries, 1);
    assert_eq!(persisted_streak(&db.pool, habit_id).await?, (1, 1));
    Ok(())
}

#[tokio::test]
async fn streak_only_sees_thirty_most_recent_entries() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let state = auth_state()?;
    let owner_id = insert_user(&db.pool, "long@example.com").await?;
    let habit_id = insert_habit(&db.pool, owner_id).await?;
    let token = bearer(&state, "long@example.com")?;
    let app = app_router(db.pool.clone(), state);

    let today = Utc::now().date_naive();
    for offset in 1..=44 {
        sqlx::query("INSERT INTO habit_entries (habit_id, entry_date) VALUES ($1, $2)")
            .bind(habit_id)
            .bind(days_ago(today, offset))
            .execute(&db.pool)
            .await?;
    }

    let (status, _) = post_entry(&app, &token, habit_id, today).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(persisted_streak(&db.pool, habit_id).await?, (30, 30));
    Ok(())
}

#[tokio::test]
async fn backfill_recomputes_from_today() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let state = auth_state()?;
    let owner_id = insert_user(&db.pool, "backfill@example.com").await?;
    let habit_id = insert_habit(&db.pool, owner_id).await?;
    let token = bearer(&state, "backfill@example.com")?;
    let app = app_router(db.pool.clone(), state);

    let today = Utc::now().date_naive();
    for date in [today, days_ago(today, 2)] {
        let (status, _) = post_entry(&app, &token, habit_id, date).await?;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(persisted_streak(&db.pool, habit_id).await?, (1, 1));

    let (status, _) = post_entry(&app, &token, habit_id, days_ago(today, 1)).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(persisted_streak(&db.pool, habit_id).await?, (3, 3));
    Ok(())
}

#[tokio::test]
async fn future_date_is_rejected() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let state = auth_state()?;
    let owner_id = insert_user(&db.pool, "future@example.com").await?;
    let habit_id = insert_habit(&db.pool, owner_id).await?;
    let token = bearer(&state, "future@example.com")?;
    let app = app_router(db.pool.clone(), state);

    let tomorrow = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .context("tomorrow")?;
    let (status, body) = post_entry(&app, &token, habit_id, tomorrow).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Entry date cannot be in the future");

    let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habit_entries WHERE habit_id = $1")
        .bind(habit_id)
        .fetch_one(&db.pool)
        .await?;
    assert_eq!(entries, 0);
    assert_eq!(persisted_streak(&db.pool, habit_id).await?, (0, 0));
    Ok(())
}

#[tokio::test]
async fn other_owners_habit_is_not_found() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let state = auth_state()?;
    let owner_id = insert_user(&db.pool, "owner@example.com").await?;
    insert_user(&db.pool, "intruder@example.com").await?;
    let habit_id = insert_habit(&db.pool, owner_id).await?;
    let token = bearer(&state, "intruder@example.com")?;
    let app = app_router(db.pool.clone(), state);

    let (status, body) = post_entry(&app, &token, habit_id, Utc::now().date_naive()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Habit not found");
    assert_eq!(persisted_streak(&db.pool, habit_id).await?, (0, 0));
    Ok(())
}
