//! Common test fixtures for vegetation audit tests.
//!
//! This module provides pre-defined places, radii and configurations that
//! represent common audit scenarios.

use std::sync::Arc;

use audit_common::{Coordinate, Persona};
use vegetation::{AnalysisConfig, Region};

/// Well-known places as (latitude, longitude).
pub mod places {
    /// Central Amazon basin, dense forest
    pub const AMAZON: (f64, f64) = (-3.4653, -62.2159);

    /// New Delhi, mixed urban and agricultural
    pub const NEW_DELHI: (f64, f64) = (28.6139, 77.2090);

    /// Central Sahara, bare ground
    pub const SAHARA: (f64, f64) = (23.4162, 25.6628);

    /// Mid Pacific, open water
    pub const PACIFIC: (f64, f64) = (0.0, -160.0);

    /// Null island
    pub const ORIGIN: (f64, f64) = (0.0, 0.0);

    /// Latitude outside the valid range
    pub const INVALID: (f64, f64) = (91.0, 0.0);
}

/// Common radii in kilometers.
pub mod radii {
    /// Smallest radius any persona may request
    pub const MIN: f64 = 1.0;

    /// Default for the public and student personas
    pub const NEIGHBORHOOD: f64 = 5.0;

    /// Beyond the public and student maximum, within the scientist maximum
    pub const WIDE: f64 = 35.0;
}

/// A validated coordinate from a `places` constant.
pub fn coordinate(place: (f64, f64)) -> Coordinate {
    Coordinate::new(place.0, place.1).unwrap_or_else(|e| panic!("bad fixture {:?}: {}", place, e))
}

/// Default analysis configuration with a short provider timeout.
pub fn test_config() -> Arc<AnalysisConfig> {
    Arc::new(AnalysisConfig {
        provider_timeout_secs: 1,
        ..AnalysisConfig::default()
    })
}

/// A region built with the persona's radius range from the default config.
pub fn region_for(place: (f64, f64), radius_km: f64, persona: Persona) -> Region {
    let config = AnalysisConfig::default();
    let policy = config
        .policy(persona)
        .unwrap_or_else(|e| panic!("no policy for {}: {}", persona, e));
    Region::build(coordinate(place), radius_km, &policy.radius)
        .unwrap_or_else(|e| panic!("bad region fixture: {}", e))
}

/// A temporary directory that is removed when dropped.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {}", e))
}
