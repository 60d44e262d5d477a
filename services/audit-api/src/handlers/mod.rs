//! HTTP request handlers for the audit API.

pub mod audit;
pub mod composite;
pub mod geocode;
pub mod health;
pub mod trend;

use audit_common::{AtStage, AuditStage, Coordinate, Persona};
use serde::Deserialize;
use vegetation::PersonaPolicy;

use crate::error::ApiError;
use crate::state::AppState;

/// Where and for whom a request runs.
///
/// Either `place` or both `lat` and `lon` must be given; coordinates win
/// when both are present.
#[derive(Debug, Default, Deserialize)]
pub struct LocationParams {
    pub place: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
    pub persona: Option<String>,
}

/// A location request after geocoding and persona lookup.
#[derive(Debug)]
pub struct ResolvedRequest<'a> {
    pub coordinate: Coordinate,
    pub radius_km: f64,
    pub persona: Persona,
    pub policy: &'a PersonaPolicy,
}

impl LocationParams {
    /// Resolve persona, coordinate and radius.
    ///
    /// A missing radius takes the persona's default; a given one is left
    /// for the region builder to validate and clamp.
    pub async fn resolve<'a>(&self, state: &'a AppState) -> Result<ResolvedRequest<'a>, ApiError> {
        let persona = match self.persona.as_deref() {
            Some(raw) => Persona::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown persona: {}", raw)))?,
            None => Persona::default(),
        };
        let policy = state.analysis.policy(persona)?;

        let coordinate = match (self.lat, self.lon, self.place.as_deref()) {
            (Some(lat), Some(lon), _) => Coordinate::new(lat, lon).at_stage(AuditStage::Region)?,
            (None, None, Some(place)) => state
                .geocoder
                .locate(place)
                .await
                .at_stage(AuditStage::Geocode)?,
            _ => {
                return Err(ApiError::BadRequest(
                    "Provide either place or both lat and lon".to_string(),
                ))
            }
        };

        Ok(ResolvedRequest {
            coordinate,
            radius_km: self.radius_km.unwrap_or(policy.radius.default_km),
            persona,
            policy,
        })
    }
}
