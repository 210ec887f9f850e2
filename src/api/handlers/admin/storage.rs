//! Cross-user queries for the admin surface.

use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{AdminDashboardStats, AdminUserUpdate, HabitCounts, TodoCounts, UserCounts};
use crate::api::handlers::SortOrder;
use crate::api::handlers::auth::storage::{USER_COLUMNS, UserRecord};
use crate::api::handlers::habits::storage::{HABIT_COLUMNS, habit_from_row};
use crate::api::handlers::habits::types::HabitResponse;
use crate::api::handlers::todos::storage::{TODO_COLUMNS, todo_from_row};
use crate::api::handlers::todos::types::TodoResponse;

/// Ordering and paging shared by the admin listings. `sort_column` must come
/// from a whitelist.
#[derive(Debug, Clone, Copy)]
pub(super) struct Listing {
    pub(super) sort_column: &'static str,
    pub(super) sort_order: SortOrder,
    pub(super) skip: i64,
    pub(super) limit: i64,
}

#[derive(Debug, Default)]
pub(super) struct UserFilter {
    pub(super) is_active: Option<bool>,
    pub(super) is_admin: Option<bool>,
    pub(super) is_verified: Option<bool>,
    pub(super) search: Option<String>,
}

#[derive(Debug, Default)]
pub(super) struct TodoFilter {
    pub(super) is_completed: Option<bool>,
    pub(super) priority: Option<String>,
    pub(super) category: Option<String>,
    pub(super) owner_id: Option<Uuid>,
    pub(super) search: Option<String>,
}

#[derive(Debug, Default)]
pub(super) struct HabitFilter {
    pub(super) is_active: Option<bool>,
    pub(super) frequency: Option<String>,
    pub(super) owner_id: Option<Uuid>,
    pub(super) search: Option<String>,
}

fn push_listing(builder: &mut QueryBuilder<'static, Postgres>, listing: Listing) {
    builder
        .push(" ORDER BY ")
        .push(listing.sort_column)
        .push(" ")
        .push(listing.sort_order.as_sql())
        .push(" NULLS LAST, id OFFSET ")
        .push_bind(listing.skip)
        .push(" LIMIT ")
        .push_bind(listing.limit);
}

fn push_flag(builder: &mut QueryBuilder<'static, Postgres>, column: &str, value: Option<bool>) {
    if let Some(value) = value {
        builder.push(format!(" AND {column} = ")).push_bind(value);
    }
}

fn push_eq(builder: &mut QueryBuilder<'static, Postgres>, column: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        builder
            .push(format!(" AND {column} = "))
            .push_bind(value.to_string());
    }
}

/// `AND (a ILIKE $n OR b ILIKE $n ...)` over nullable text columns.
fn push_search(builder: &mut QueryBuilder<'static, Postgres>, columns: &[&str], search: Option<&str>) {
    let Some(term) = search.map(str::trim).filter(|term| !term.is_empty()) else {
        return;
    };
    let pattern = crate::api::handlers::like_pattern(term);
    builder.push(" AND (");
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            builder.push(" OR ");
        }
        builder
            .push(format!("COALESCE({column}, '') ILIKE "))
            .push_bind(pattern.clone());
    }
    builder.push(")");
}

pub(super) fn users_query(filter: &UserFilter, listing: Listing) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
    push_flag(&mut builder, "is_active", filter.is_active);
    push_flag(&mut builder, "is_admin", filter.is_admin);
    push_flag(&mut builder, "is_verified", filter.is_verified);
    push_search(
        &mut builder,
        &["email", "username", "full_name"],
        filter.search.as_deref(),
    );
    push_listing(&mut builder, listing);
    builder
}

pub(super) fn todos_query(filter: &TodoFilter, listing: Listing) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {TODO_COLUMNS} FROM todos WHERE TRUE"));
    push_flag(&mut builder, "is_completed", filter.is_completed);
    push_eq(&mut builder, "priority", filter.priority.as_deref());
    push_eq(&mut builder, "category", filter.category.as_deref());
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND owner_id = ").push_bind(owner_id);
    }
    push_search(&mut builder, &["title", "description"], filter.search.as_deref());
    push_listing(&mut builder, listing);
    builder
}

pub(super) fn habits_query(
    filter: &HabitFilter,
    listing: Listing,
) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {HABIT_COLUMNS} FROM habits WHERE TRUE"));
    push_flag(&mut builder, "is_active", filter.is_active);
    push_eq(&mut builder, "frequency", filter.frequency.as_deref());
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND owner_id = ").push_bind(owner_id);
    }
    push_search(&mut builder, &["name", "description"], filter.search.as_deref());
    push_listing(&mut builder, listing);
    builder
}

pub(super) async fn dashboard_counts(pool: &PgPool) -> Result<AdminDashboardStats, sqlx::Error> {
    let query = r"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE is_active) AS active_users,
            (SELECT COUNT(*) FROM users WHERE is_admin) AS admin_users,
            (SELECT COUNT(*) FROM todos) AS total_todos,
            (SELECT COUNT(*) FROM todos WHERE is_completed) AS completed_todos,
            (SELECT COUNT(*) FROM habits) AS total_habits,
            (SELECT COUNT(*) FROM habits WHERE is_active) AS active_habits
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    let total_todos: i64 = row.get("total_todos");
    let completed_todos: i64 = row.get("completed_todos");
    Ok(AdminDashboardStats {
        user_stats: UserCounts {
            total_users: row.get("total_users"),
            active_users: row.get("active_users"),
            admin_users: row.get("admin_users"),
        },
        todo_stats: TodoCounts {
            total_todos,
            completed_todos,
            pending_todos: total_todos - completed_todos,
        },
        habit_stats: HabitCounts {
            total_habits: row.get("total_habits"),
            active_habits: row.get("active_habits"),
        },
    })
}

pub(super) async fn fetch_users(
    pool: &PgPool,
    filter: &UserFilter,
    listing: Listing,
) -> Result<Vec<UserRecord>, sqlx::Error> {
    let mut builder = users_query(filter, listing);
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = builder.sql()
    );
    builder
        .build_query_as::<UserRecord>()
        .fetch_all(pool)
        .instrument(span)
        .await
}

pub(super) async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, UserRecord>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
}

pub(super) async fn update_user_flags(
    pool: &PgPool,
    user_id: Uuid,
    update: &AdminUserUpdate,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE users
        SET is_active = COALESCE($2, is_active),
            is_admin = COALESCE($3, is_admin),
            is_verified = COALESCE($4, is_verified),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, UserRecord>(&query)
        .bind(user_id)
        .bind(update.is_active)
        .bind(update.is_admin)
        .bind(update.is_verified)
        .fetch_optional(pool)
        .instrument(span)
        .await
}

/// Delete a user and, by cascade, everything they own.
pub(super) async fn remove_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn fetch_all_todos(
    pool: &PgPool,
    filter: &TodoFilter,
    listing: Listing,
) -> Result<Vec<TodoResponse>, sqlx::Error> {
    let mut builder = todos_query(filter, listing);
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
    Ok(rows.iter().map(todo_from_row).collect())
}

pub(super) async fn fetch_all_habits(
    pool: &PgPool,
    filter: &HabitFilter,
    listing: Listing,
) -> Result<Vec<HabitResponse>, sqlx::Error> {
    let mut builder = habits_query(filter, listing);
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
    Ok(rows.iter().map(habit_from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(column: &'static str) -> Listing {
        Listing {
            sort_column: column,
            sort_order: SortOrder::Desc,
            skip: 0,
            limit: 100,
        }
    }

    #[test]
    fn users_query_without_filters() {
        let builder = users_query(&UserFilter::default(), listing("created_at"));
        assert!(builder.sql().ends_with(
            "WHERE TRUE ORDER BY created_at DESC NULLS LAST, id OFFSET $1 LIMIT $2"
        ));
    }

    #[test]
    fn users_query_search_spans_columns() {
        let filter = UserFilter {
            is_admin: Some(true),
            search: Some("ali".to_string()),
            ..UserFilter::default()
        };
        let builder = users_query(&filter, listing("email"));
        let sql = builder.sql();
        assert!(sql.contains("AND is_admin = $1"));
        assert!(sql.contains(
            "AND (COALESCE(email, '') ILIKE $2 OR COALESCE(username, '') ILIKE $3 OR COALESCE(full_name, '') ILIKE $4)"
        ));
        assert!(sql.contains("ORDER BY email DESC"));
    }

    #[test]
    fn todos_query_filters() {
        let filter = TodoFilter {
            is_completed: Some(false),
            priority: Some("high".to_string()),
            category: Some("  ".to_string()),
            owner_id: Some(Uuid::nil()),
            search: None,
        };
        let builder = todos_query(&filter, listing("due_date"));
        let sql = builder.sql();
        assert!(sql.contains("AND is_completed = $1"));
        assert!(sql.contains("AND priority = $2"));
        assert!(!sql.contains("category ="));
        assert!(sql.contains("AND owner_id = $3"));
    }

    #[test]
    fn habits_query_filters() {
        let filter = HabitFilter {
            frequency: Some("weekly".to_string()),
            search: Some("run".to_string()),
            ..HabitFilter::default()
        };
        let builder = habits_query(&filter, listing("best_streak"));
        let sql = builder.sql();
        assert!(sql.contains("AND frequency = $1"));
        assert!(sql.contains("COALESCE(name, '') ILIKE $2"));
        assert!(sql.contains("ORDER BY best_streak DESC"));
    }
}
