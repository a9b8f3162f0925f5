//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use emissions_edge::api::{create_app, DashboardState};
use emissions_edge::emissions::GwpTable;
use emissions_edge::pipeline::{CannedSource, PipelineContext, ProcessingLoop};
use emissions_edge::publish::LogPublisher;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn create_test_state() -> DashboardState {
    DashboardState::new(PipelineContext::new(GwpTable::default(), 5), 1000.0)
}

/// State whose history holds the first `n` reference readings.
async fn populated_state(n: usize) -> DashboardState {
    let state = create_test_state();
    let mut pl = ProcessingLoop::new(
        state.ctx.clone(),
        Box::new(LogPublisher),
        CancellationToken::new(),
    );
    let mut source = CannedSource::reference();
    for _ in 0..n {
        pl.tick(&mut source).await;
    }
    state
}

async fn get_json(state: DashboardState, uri: &str) -> (StatusCode, serde_json::Value) {
    let app = create_app(state);
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

/// All v1 GET endpoints except /latest succeed on an empty pipeline.
#[tokio::test]
async fn test_v1_get_endpoints_return_200() {
    let endpoints = [
        "/api/v1/data",
        "/api/v1/history",
        "/api/v1/recommendation",
        "/api/v1/status",
        "/api/v1/series",
        "/api/v1/health",
        "/data",
        "/health",
    ];

    for endpoint in &endpoints {
        let app = create_app(create_test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri(*endpoint)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            resp.status().is_success(),
            "GET {endpoint} returned status {}",
            resp.status()
        );
    }
}

#[tokio::test]
async fn test_v1_data_placeholder_before_first_record() {
    let (status, body) = get_json(create_test_state(), "/api/v1/data").await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["current"]["time"], "N/A");
    assert_eq!(data["current"]["co2e"], 0.0);
    assert_eq!(data["current"]["alert"], false);
    assert_eq!(data["current"]["data"]["Tier1"]["N2O"], 0.0);
    assert_eq!(data["history"].as_array().unwrap().len(), 0);
    assert_eq!(data["recommendation"], "No recommendations yet");
    assert_eq!(body["meta"]["api_version"], "1");
    assert_eq!(body["meta"]["unit"], "kg");
}

#[tokio::test]
async fn test_data_reports_latest_record_and_history() {
    let state = populated_state(6).await;
    let (status, body) = get_json(state, "/data").await;
    assert_eq!(status, StatusCode::OK);

    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 5);
    let current_co2e = body["current"]["co2e"].as_f64().unwrap();
    assert!((current_co2e - 626.86).abs() < 1e-6);
    assert_eq!(body["current"], history[4]);
    assert!(history[0]["alert"].as_bool().unwrap());
}

#[tokio::test]
async fn test_latest_404_then_200() {
    let (status, body) = get_json(create_test_state(), "/api/v1/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_RECORDS");

    let (status, body) = get_json(populated_state(2).await, "/api/v1/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["alert"], true);
}

#[tokio::test]
async fn test_recommendation_reflects_listener_writes() {
    let state = create_test_state();
    state.ctx.recommendation().set("Repair leaking valve V-12");

    let (_, body) = get_json(state.clone(), "/api/v1/recommendation").await;
    assert_eq!(body["data"]["recommendation"], "Repair leaking valve V-12");
    assert_eq!(body["data"]["received"], true);

    let (_, body) = get_json(state, "/data").await;
    assert_eq!(body["recommendation"], "Repair leaking valve V-12");
}

#[tokio::test]
async fn test_series_projection() {
    let (status, body) = get_json(populated_state(1).await, "/api/v1/series").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["threshold_kg"], 1000.0);

    let points = body["data"]["points"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    let co2_total = points[0]["co2_total"].as_f64().unwrap();
    assert!((co2_total - 460.0).abs() < 1e-9);
    assert_eq!(points[0]["ch4"], 1.5);
    assert_eq!(points[0]["n2o"], 0.28);
}

#[tokio::test]
async fn test_status_counts_ticks() {
    let (_, body) = get_json(populated_state(3).await, "/api/v1/status").await;
    assert_eq!(body["data"]["stats"]["ticks"], 3);
    assert_eq!(body["data"]["stats"]["records_produced"], 3);
    assert_eq!(body["data"]["stats"]["alerts"], 1);
    assert_eq!(body["data"]["history_len"], 3);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (status, body) = get_json(create_test_state(), "/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
