//! Two-year audit handler.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    Json,
};
use tracing::{instrument, warn};
use vegetation::AuditView;

use super::LocationParams;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/audit
#[instrument(skip(state))]
pub async fn audit_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LocationParams>,
) -> Result<Json<AuditView>, ApiError> {
    let started = Instant::now();
    metrics::counter!("audits_total").increment(1);

    let outcome = run(&state, &params).await;
    metrics::histogram!("audit_duration_seconds").record(started.elapsed().as_secs_f64());

    if let Err(ApiError::Stage(e)) = &outcome {
        warn!(stage = %e.stage, error = %e.source, "Audit failed");
        metrics::counter!("audit_failures_total", "stage" => e.stage.to_string()).increment(1);
    }
    outcome
}

async fn run(state: &AppState, params: &LocationParams) -> Result<Json<AuditView>, ApiError> {
    let request = params.resolve(state).await?;
    let result = state
        .orchestrator
        .run_audit(request.coordinate, request.radius_km, request.persona)
        .await?;
    Ok(Json(result.view(request.policy)))
}
