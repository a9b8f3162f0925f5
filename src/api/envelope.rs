//! `{data, meta}` envelope for the v1 reporting routes.
//!
//! The legacy root routes (`/data`, `/health`) stay unwrapped for the
//! dashboard. Every quantity the API reports is in kilograms, so the unit is
//! stated once in `meta` instead of on each field.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

pub const API_VERSION: &str = "1";

/// Mass unit for every quantity in a v1 body
pub const MASS_UNIT: &str = "kg";

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub generated_at: String,
    pub api_version: &'static str,
    pub unit: &'static str,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            api_version: API_VERSION,
            unit: MASS_UNIT,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::now(),
        };
        (StatusCode::OK, axum::Json(body)).into_response()
    }
}

/// Failure reasons a reporting client can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    /// The pipeline has not accepted a reading yet
    NoRecords,
    NotFound,
}

impl ApiErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::NoRecords | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ApiErrorCode,
    pub message: String,
}

/// `{"error": {"code", "message"}, "meta": {..}}`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code,
                message: message.into(),
            },
            meta: ResponseMeta::now(),
        };
        (code.status(), axum::Json(body)).into_response()
    }

    pub fn no_records() -> Response {
        Self::new(
            ApiErrorCode::NoRecords,
            "No readings accepted yet; history is empty",
        )
    }

    pub fn not_found(message: impl Into<String>) -> Response {
        Self::new(ApiErrorCode::NotFound, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ok_carries_unit_and_version() {
        let resp = ApiResponse::ok(serde_json::json!({"co2e": 580.94}));
        assert_eq!(resp.status(), StatusCode::OK);

        let v = body(resp).await;
        assert_eq!(v["data"]["co2e"], 580.94);
        assert_eq!(v["meta"]["api_version"], "1");
        assert_eq!(v["meta"]["unit"], "kg");
        assert!(v["meta"]["generated_at"].is_string());
    }

    #[tokio::test]
    async fn test_no_records_code() {
        let resp = ApiErrorResponse::no_records();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let v = body(resp).await;
        assert_eq!(v["error"]["code"], "NO_RECORDS");
        assert_eq!(v["meta"]["unit"], "kg");
    }

    #[tokio::test]
    async fn test_not_found_code() {
        let v = body(ApiErrorResponse::not_found("No route for /x")).await;
        assert_eq!(v["error"]["code"], "NOT_FOUND");
        assert_eq!(v["error"]["message"], "No route for /x");
    }
}
