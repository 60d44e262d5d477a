//! Yearly mean-index trend handler.

use std::sync::Arc;

use audit_common::{AuditField, AuditYear};
use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use vegetation::TrendView;

use super::LocationParams;
use crate::error::ApiError;
use crate::state::AppState;

/// Longest series a single request may ask for.
pub const MAX_TREND_YEARS: i32 = 50;

// Not flattened: serde_urlencoded cannot parse numbers inside `#[serde(flatten)]`.
#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    pub place: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
    pub persona: Option<String>,
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl TrendParams {
    pub fn location(&self) -> LocationParams {
        LocationParams {
            place: self.place.clone(),
            lat: self.lat,
            lon: self.lon,
            radius_km: self.radius_km,
            persona: self.persona.clone(),
        }
    }

    /// Requested year range, defaulting to the configured audit years.
    pub fn years(
        &self,
        default_from: AuditYear,
        default_to: AuditYear,
    ) -> Result<(AuditYear, AuditYear), ApiError> {
        let from = self.from.map(AuditYear).unwrap_or(default_from);
        let to = self.to.map(AuditYear).unwrap_or(default_to);

        if from > to {
            return Err(ApiError::BadRequest(format!(
                "from ({}) must not be after to ({})",
                from, to
            )));
        }
        if to.0 - from.0 >= MAX_TREND_YEARS {
            return Err(ApiError::BadRequest(format!(
                "at most {} years per trend",
                MAX_TREND_YEARS
            )));
        }
        Ok((from, to))
    }
}

/// GET /api/trend
#[instrument(skip(state))]
pub async fn trend_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<TrendParams>,
) -> Result<Json<TrendView>, ApiError> {
    let (from, to) = params.years(state.analysis.baseline_year, state.analysis.target_year)?;
    let location = params.location();
    let request = location.resolve(&state).await?;

    if !request.policy.exposes(AuditField::Trend) {
        return Err(ApiError::NotExposed {
            persona: request.persona,
            field: AuditField::Trend,
        });
    }

    let series = state
        .orchestrator
        .run_trend(request.coordinate, request.radius_km, request.persona, from, to)
        .await?;

    series
        .view(request.policy)
        .map(Json)
        .ok_or(ApiError::NotExposed {
            persona: request.persona,
            field: AuditField::Trend,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(from: Option<i32>, to: Option<i32>) -> TrendParams {
        TrendParams {
            from,
            to,
            ..TrendParams::default()
        }
    }

    #[test]
    fn test_default_years() {
        let (from, to) = params(None, None)
            .years(AuditYear(2014), AuditYear(2024))
            .unwrap();
        assert_eq!((from.0, to.0), (2014, 2024));
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(params(Some(2020), Some(2015))
            .years(AuditYear(2014), AuditYear(2024))
            .is_err());
    }

    #[test]
    fn test_overlong_range_rejected() {
        assert!(params(Some(1950), Some(2024))
            .years(AuditYear(2014), AuditYear(2024))
            .is_err());
        assert!(params(Some(2000), Some(2024))
            .years(AuditYear(2014), AuditYear(2024))
            .is_ok());
    }
}
