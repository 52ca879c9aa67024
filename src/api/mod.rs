//! HTTP surface of the dashboard
//!
//! Serves the single page and the JSON endpoints it fetches from.

pub mod handlers;
pub mod page;
pub mod service;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::AppState;
pub use service::{DashboardService, Selection};

pub fn router(service: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/v1/health", get(handlers::health))
        // Full redraw
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        // Individual pieces
        .route("/api/v1/kpis", get(handlers::get_kpis))
        .route("/api/v1/metrics", get(handlers::get_metrics))
        .route("/api/v1/periods", get(handlers::get_periods))
        .route("/api/v1/charts/:chart", get(handlers::get_chart))
        .route("/api/v1/comparison", get(handlers::get_comparison))
        // State and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
