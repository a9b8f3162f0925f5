//! API route handlers
//!
//! Read-only views over the pipeline context: the dashboard report, the
//! rolling history, the latest record, the current recommendation, pipeline
//! statistics and a chart-friendly series projection.

use axum::{extract::State, response::Response, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::pipeline::{DataReport, PipelineContext, PipelineStats};
use crate::types::{Gas, ProcessedRecord};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Handles into the running pipeline
    pub ctx: PipelineContext,
    /// Alert threshold in force, reported alongside series data
    pub alert_threshold_kg: f64,
    /// Names of the wired components, for `/status`
    pub components: ComponentNames,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentNames {
    pub source: String,
    pub publisher: String,
    pub baseline: String,
}

impl DashboardState {
    pub fn new(ctx: PipelineContext, alert_threshold_kg: f64) -> Self {
        Self {
            ctx,
            alert_threshold_kg,
            components: ComponentNames::default(),
        }
    }

    pub fn with_components(mut self, components: ComponentNames) -> Self {
        self.components = components;
        self
    }
}

// ============================================================================
// Dashboard Report
// ============================================================================

/// GET /data - Dashboard report `{current, history, recommendation}` (unwrapped)
pub async fn get_data_legacy(State(state): State<DashboardState>) -> Json<DataReport> {
    Json(state.ctx.report().await)
}

/// GET /api/v1/data - Dashboard report in the response envelope
pub async fn get_data(State(state): State<DashboardState>) -> Response {
    ApiResponse::ok(state.ctx.report().await)
}

// ============================================================================
// History
// ============================================================================

/// GET /api/v1/history - Rolling history, oldest first
pub async fn get_history(State(state): State<DashboardState>) -> Response {
    ApiResponse::ok(state.ctx.history_snapshot().await)
}

/// GET /api/v1/latest - Most recent record, 404 before the first one
pub async fn get_latest(State(state): State<DashboardState>) -> Response {
    match state.ctx.latest().await {
        Some(record) => ApiResponse::ok(record),
        None => ApiErrorResponse::no_records(),
    }
}

// ============================================================================
// Recommendation
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendation: String,
    /// False until the first advisory arrives
    pub received: bool,
}

/// GET /api/v1/recommendation - Latest cloud recommendation
pub async fn get_recommendation(State(state): State<DashboardState>) -> Response {
    let rec = state.ctx.recommendation();
    ApiResponse::ok(RecommendationResponse {
        recommendation: rec.get(),
        received: !rec.is_default(),
    })
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub history_len: usize,
    pub history_capacity: usize,
    pub alert_threshold_kg: f64,
    pub components: ComponentNames,
    pub stats: PipelineStats,
}

/// GET /api/v1/status - Pipeline statistics and wiring
pub async fn get_status(State(state): State<DashboardState>) -> Response {
    let history_len = state.ctx.history_snapshot().await.len();
    ApiResponse::ok(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.ctx.uptime_secs(),
        history_len,
        history_capacity: state.ctx.history_capacity().await,
        alert_threshold_kg: state.alert_threshold_kg,
        components: state.components.clone(),
        stats: state.ctx.stats().await,
    })
}

// ============================================================================
// Series
// ============================================================================

/// One chart point per record.
#[derive(Debug, Serialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    /// CO2 summed over Tier 1, 2 and 3
    pub co2_total: f64,
    pub ch4: f64,
    pub n2o: f64,
    pub co2e: f64,
    pub alert: bool,
}

impl From<&ProcessedRecord> for SeriesPoint {
    fn from(record: &ProcessedRecord) -> Self {
        Self {
            time: record.time,
            co2_total: record.data.total_co2(),
            ch4: record.data.tier1_value(Gas::Ch4).unwrap_or(0.0),
            n2o: record.data.tier1_value(Gas::N2o).unwrap_or(0.0),
            co2e: record.co2e,
            alert: record.alert,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub threshold_kg: f64,
    pub points: Vec<SeriesPoint>,
}

/// GET /api/v1/series - Trend data for gas and CO2e charts
pub async fn get_series(State(state): State<DashboardState>) -> Response {
    let points = state
        .ctx
        .history_snapshot()
        .await
        .iter()
        .map(SeriesPoint::from)
        .collect();
    ApiResponse::ok(SeriesResponse {
        threshold_kg: state.alert_threshold_kg,
        points,
    })
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
}

/// GET /health - Liveness probe
pub async fn health_check(State(state): State<DashboardState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.ctx.uptime_secs(),
    })
}
