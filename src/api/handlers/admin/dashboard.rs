use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;

use super::storage::dashboard_counts;
use super::types::AdminDashboardStats;
use crate::api::handlers::ApiError;
use crate::api::handlers::auth::{AuthState, principal::require_admin};

/// Platform-wide user, todo and habit totals.
#[utoipa::path(
    get,
    path = "/v1/admin/dashboard",
    responses(
        (status = 200, description = "Platform totals", body = AdminDashboardStats),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn admin_dashboard(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &pool, &auth_state).await?;
    Ok(Json(dashboard_counts(&pool).await?))
}
