use axum::{Json, response::IntoResponse};
use serde_json::json;

/// Welcome document pointing at the API docs.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the Habitrack API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
        "openapi": "/api-docs/openapi.json",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn root_is_ok() {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
