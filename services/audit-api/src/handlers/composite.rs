//! Single-year composite handler, used for timelapse frames.

use std::sync::Arc;

use audit_common::{AtStage, AuditField, AuditStage, AuditYear};
use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use vegetation::{compute_index, Composite, IndexRaster};

use super::LocationParams;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CompositeParams {
    pub place: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
    pub persona: Option<String>,
    pub year: Option<i32>,
}

impl CompositeParams {
    pub fn location(&self) -> LocationParams {
        LocationParams {
            place: self.place.clone(),
            lat: self.lat,
            lon: self.lon,
            radius_km: self.radius_km,
            persona: self.persona.clone(),
        }
    }
}

/// One year's composite and its vegetation index.
#[derive(Debug, Serialize)]
pub struct CompositeFrame {
    pub composite: Composite,
    pub index: IndexRaster,
}

/// GET /api/composite
///
/// Only for personas whose policy exposes per-pixel composites.
#[instrument(skip(state))]
pub async fn composite_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CompositeParams>,
) -> Result<Json<CompositeFrame>, ApiError> {
    let year = params
        .year
        .map(AuditYear)
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: year".to_string()))?;

    let location = params.location();
    let request = location.resolve(&state).await?;

    if !request.policy.exposes(AuditField::Composite) {
        return Err(ApiError::NotExposed {
            persona: request.persona,
            field: AuditField::Composite,
        });
    }

    let composite = state
        .orchestrator
        .get_composite(request.coordinate, request.radius_km, request.persona, year)
        .await?;
    let index = compute_index(&composite).at_stage(AuditStage::Index { year: year.0 })?;

    Ok(Json(CompositeFrame { composite, index }))
}
