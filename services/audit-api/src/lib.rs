//! Vegetation Audit API Service Library
//!
//! HTTP surface over the audit pipeline: two-year audits, yearly trends,
//! single-year composites and place suggestions.

pub mod config;
pub mod error;
pub mod geocode;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router.
///
/// `/metrics` is only mounted when a Prometheus handle is supplied.
pub fn router(state: Arc<AppState>, metrics: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        .route("/api/audit", get(handlers::audit::audit_handler))
        .route("/api/trend", get(handlers::trend::trend_handler))
        .route("/api/composite", get(handlers::composite::composite_handler))
        .route(
            "/api/geocode/suggest",
            get(handlers::geocode::suggest_handler),
        )
        .route("/health", get(handlers::health::health_handler));

    if let Some(handle) = metrics {
        app = app
            .route("/metrics", get(handlers::health::metrics_handler))
            .layer(Extension(handle));
    }

    app.layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
