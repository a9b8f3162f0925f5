//! REST API module using Axum
//!
//! Read-only reporting surface over the pipeline:
//! - v1 API with consistent `{data, meta}` envelope under `/api/v1`
//! - unwrapped `/data` and `/health` at the root for the dashboard page

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::{ComponentNames, DashboardState};

use axum::http::{header, HeaderValue, Method, Uri};
use axum::response::Response;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Environment variable listing extra allowed CORS origins.
pub const CORS_ENV_VAR: &str = "EMISSIONS_CORS_ORIGINS";

/// JSON 404 for any unmatched path.
async fn not_found(uri: Uri) -> Response {
    envelope::ApiErrorResponse::not_found(format!("No route for {}", uri.path()))
}

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `EMISSIONS_CORS_ORIGINS` to a comma-separated list of allowed origins
/// when the dashboard is served from elsewhere; `*` allows any origin.
fn build_cors_layer() -> CorsLayer {
    cors_layer(std::env::var(CORS_ENV_VAR).ok().as_deref())
}

fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    let Some(origins) = origins else {
        return layer;
    };
    let entries: Vec<&str> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    // A wildcard inside an origin list is rejected by tower-http.
    if entries.contains(&"*") {
        tracing::info!("CORS: allowing any origin");
        return layer.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = entries.iter().filter_map(|o| o.parse().ok()).collect();
    tracing::info!(origins = %origins, "CORS: allowing configured origins");
    layer.allow_origin(allowed)
}

/// Create the complete application router.
pub fn create_app(state: DashboardState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::legacy_routes(state))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
}
