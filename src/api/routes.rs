//! API route definitions
//!
//! - /api/v1/data - Dashboard report (current, history, recommendation)
//! - /api/v1/history - Rolling history
//! - /api/v1/latest - Most recent record
//! - /api/v1/recommendation - Latest cloud recommendation
//! - /api/v1/status - Pipeline statistics
//! - /api/v1/series - Chart series
//! - /data, /health - Unwrapped legacy routes for the dashboard

use axum::{routing::get, Router};

use super::handlers::{self, DashboardState};

/// Create all v1 API routes
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/data", get(handlers::get_data))
        .route("/history", get(handlers::get_history))
        .route("/latest", get(handlers::get_latest))
        .route("/recommendation", get(handlers::get_recommendation))
        .route("/status", get(handlers::get_status))
        .route("/series", get(handlers::get_series))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

/// Root-level routes kept for the dashboard page
pub fn legacy_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/data", get(handlers::get_data_legacy))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::GwpTable;
    use crate::pipeline::PipelineContext;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn create_test_state() -> DashboardState {
        DashboardState::new(PipelineContext::new(GwpTable::default(), 5), 1000.0)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_api_routes_health() {
        let (status, body) = get(api_routes(create_test_state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_api_routes_status() {
        let (status, body) = get(api_routes(create_test_state()), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["history_capacity"], 5);
        assert_eq!(body["data"]["stats"]["ticks"], 0);
    }

    #[tokio::test]
    async fn test_latest_empty_is_404() {
        let (status, body) = get(api_routes(create_test_state()), "/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NO_RECORDS");
    }

    #[tokio::test]
    async fn test_legacy_data_is_unwrapped() {
        let (status, body) = get(legacy_routes(create_test_state()), "/data").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("meta").is_none());
        assert_eq!(body["current"]["time"], "N/A");
        assert_eq!(body["recommendation"], "No recommendations yet");
    }
}
