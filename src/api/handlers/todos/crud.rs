//! Create, list, read, update and delete todos.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::TODO_NOT_FOUND;
use super::storage::{NewTodo, fetch_todo, fetch_todos, insert_todo, remove_todo, update_todo};
use super::types::{CreateTodoRequest, TodoListQuery, TodoResponse, UpdateTodoRequest};
use crate::api::handlers::auth::{AuthState, principal::require_auth};
use crate::api::handlers::{ApiError, Pagination};

#[utoipa::path(
    post,
    path = "/v1/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn create_todo(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateTodoRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Todo title is required"));
    }

    let todo = insert_todo(
        &pool,
        user.id,
        &NewTodo {
            title,
            description: request.description.as_deref(),
            priority: request.priority,
            category: request.category.as_deref().map(str::trim),
            due_date: request.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(todo)))
}

#[utoipa::path(
    get,
    path = "/v1/todos",
    params(TodoListQuery),
    responses(
        (status = 200, description = "Todos of the current user", body = [TodoResponse]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn list_todos(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<TodoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .default_bounds();

    let todos = fetch_todos(&pool, user.id, query.completed, skip, limit).await?;
    Ok(Json(todos))
}

#[utoipa::path(
    get,
    path = "/v1/todos/{todo_id}",
    params(("todo_id" = Uuid, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo", body = TodoResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Todo not found")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn get_todo(
    Path(todo_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let todo = fetch_todo(&pool, user.id, todo_id)
        .await?
        .ok_or(ApiError::NotFound(TODO_NOT_FOUND))?;
    Ok(Json(todo))
}

/// Partial update. Completing a todo stamps `completed_at`; reopening clears it.
#[utoipa::path(
    put,
    path = "/v1/todos/{todo_id}",
    params(("todo_id" = Uuid, Path, description = "Todo id")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = TodoResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Todo not found")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn put_todo(
    Path(todo_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateTodoRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    if request
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(ApiError::bad_request("Todo title cannot be empty"));
    }

    let todo = update_todo(&pool, user.id, todo_id, &request)
        .await?
        .ok_or(ApiError::NotFound(TODO_NOT_FOUND))?;
    Ok(Json(todo))
}

#[utoipa::path(
    delete,
    path = "/v1/todos/{todo_id}",
    params(("todo_id" = Uuid, Path, description = "Todo id")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Todo not found")
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn delete_todo(
    Path(todo_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    if remove_todo(&pool, user.id, todo_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(TODO_NOT_FOUND))
    }
}
