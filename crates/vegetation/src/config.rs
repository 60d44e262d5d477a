//! Configuration for the analysis pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use audit_common::{AuditError, AuditField, AuditYear, Persona, Result};
use serde::{Deserialize, Serialize};

/// Pipeline configuration, read once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Scenes with cloud cover above this percentage are excluded.
    pub cloud_threshold_pct: f64,

    /// Index change below which a pixel is considered stable.
    pub noise_floor: f64,

    /// Earlier year of the comparison.
    pub baseline_year: AuditYear,

    /// Later year of the comparison.
    pub target_year: AuditYear,

    /// Nominal pixel size for region grids in meters.
    pub pixel_size_m: f64,

    /// Upper bound on either grid dimension; pixels are coarsened to fit.
    pub max_grid_dim: usize,

    /// Timeout for a single composite request in seconds.
    pub provider_timeout_secs: u64,

    /// Per-persona radius range and exposed fields.
    pub personas: BTreeMap<Persona, PersonaPolicy>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cloud_threshold_pct: 60.0,
            noise_floor: 0.05,
            baseline_year: AuditYear(2014),
            target_year: AuditYear(2024),
            pixel_size_m: 30.0,
            max_grid_dim: 2048,
            provider_timeout_secs: 60,
            personas: default_personas(),
        }
    }
}

impl AnalysisConfig {
    /// Apply environment variable overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("CLOUD_THRESHOLD_PCT") {
            if let Ok(pct) = val.parse() {
                self.cloud_threshold_pct = pct;
            }
        }

        if let Ok(val) = std::env::var("NDVI_NOISE_FLOOR") {
            if let Ok(eps) = val.parse() {
                self.noise_floor = eps;
            }
        }

        if let Ok(val) = std::env::var("BASELINE_YEAR") {
            if let Ok(year) = val.parse() {
                self.baseline_year = AuditYear(year);
            }
        }

        if let Ok(val) = std::env::var("TARGET_YEAR") {
            if let Ok(year) = val.parse() {
                self.target_year = AuditYear(year);
            }
        }

        if let Ok(val) = std::env::var("PIXEL_SIZE_M") {
            if let Ok(size) = val.parse() {
                self.pixel_size_m = size;
            }
        }

        if let Ok(val) = std::env::var("MAX_GRID_DIM") {
            if let Ok(dim) = val.parse() {
                self.max_grid_dim = dim;
            }
        }

        if let Ok(val) = std::env::var("PROVIDER_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.provider_timeout_secs = secs;
            }
        }

        self
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.cloud_threshold_pct) {
            return Err(AuditError::InvalidConfig(
                "cloud_threshold_pct must be in [0, 100]".to_string(),
            ));
        }

        if !(self.noise_floor > 0.0 && self.noise_floor < 1.0) {
            return Err(AuditError::InvalidConfig(
                "noise_floor must be in (0, 1)".to_string(),
            ));
        }

        if self.baseline_year >= self.target_year {
            return Err(AuditError::InvalidConfig(format!(
                "baseline_year {} must precede target_year {}",
                self.baseline_year, self.target_year
            )));
        }

        if !(self.pixel_size_m > 0.0) {
            return Err(AuditError::InvalidConfig(
                "pixel_size_m must be > 0".to_string(),
            ));
        }

        if self.max_grid_dim == 0 {
            return Err(AuditError::InvalidConfig(
                "max_grid_dim must be > 0".to_string(),
            ));
        }

        if self.provider_timeout_secs == 0 {
            return Err(AuditError::InvalidConfig(
                "provider_timeout_secs must be > 0".to_string(),
            ));
        }

        for persona in Persona::ALL {
            let policy = self.personas.get(&persona).ok_or_else(|| {
                AuditError::InvalidConfig(format!("missing policy for persona '{}'", persona))
            })?;
            policy
                .radius
                .validate()
                .map_err(|msg| AuditError::InvalidConfig(format!("{}: {}", persona, msg)))?;
        }

        Ok(())
    }

    /// Policy for a persona.
    pub fn policy(&self, persona: Persona) -> Result<&PersonaPolicy> {
        self.personas.get(&persona).ok_or_else(|| {
            AuditError::InvalidConfig(format!("missing policy for persona '{}'", persona))
        })
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// Allowed analysis radius for a persona, in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    pub min_km: f64,
    pub max_km: f64,
    pub default_km: f64,
}

impl RadiusRange {
    pub fn new(min_km: f64, max_km: f64, default_km: f64) -> Self {
        Self {
            min_km,
            max_km,
            default_km,
        }
    }

    /// Clamp a requested radius into the range.
    pub fn clamp(&self, radius_km: f64) -> f64 {
        radius_km.max(self.min_km).min(self.max_km)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !(self.min_km > 0.0) {
            return Err("min_km must be > 0".to_string());
        }
        if self.max_km < self.min_km {
            return Err("max_km must be >= min_km".to_string());
        }
        if self.default_km < self.min_km || self.default_km > self.max_km {
            return Err("default_km must lie within [min_km, max_km]".to_string());
        }
        Ok(())
    }
}

/// What a persona may request and see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaPolicy {
    pub radius: RadiusRange,
    pub fields: BTreeSet<AuditField>,
}

impl PersonaPolicy {
    pub fn exposes(&self, field: AuditField) -> bool {
        self.fields.contains(&field)
    }
}

fn default_personas() -> BTreeMap<Persona, PersonaPolicy> {
    use AuditField::*;

    let mut personas = BTreeMap::new();
    personas.insert(
        Persona::Scientist,
        PersonaPolicy {
            radius: RadiusRange::new(1.0, 50.0, 10.0),
            fields: AuditField::ALL.into_iter().collect(),
        },
    );
    personas.insert(
        Persona::Student,
        PersonaPolicy {
            radius: RadiusRange::new(1.0, 20.0, 5.0),
            fields: [
                Scores,
                Delta,
                MeanIndex,
                RelativeChange,
                ChangeLabel,
                ChangeStatistics,
                Trend,
                Composite,
            ]
            .into_iter()
            .collect(),
        },
    );
    personas.insert(
        Persona::Public,
        PersonaPolicy {
            radius: RadiusRange::new(1.0, 20.0, 5.0),
            fields: [Scores, Delta, ChangeLabel].into_iter().collect(),
        },
    );
    personas
}
