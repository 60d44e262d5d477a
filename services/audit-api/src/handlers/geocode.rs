//! Place suggestion handler.

use std::sync::Arc;

use audit_common::{AtStage, AuditStage};
use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::geocode::Place;
use crate::state::AppState;

const DEFAULT_SUGGESTIONS: usize = 5;
const MAX_SUGGESTIONS: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    pub q: String,
    pub limit: Option<usize>,
}

/// GET /api/geocode/suggest
#[instrument(skip(state))]
pub async fn suggest_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<Vec<Place>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SUGGESTIONS)
        .min(MAX_SUGGESTIONS);

    let places = state
        .geocoder
        .suggest(&params.q, limit)
        .await
        .at_stage(AuditStage::Geocode)?;

    Ok(Json(places))
}
