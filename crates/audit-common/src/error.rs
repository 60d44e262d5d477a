//! Error types for vegetation audits.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias defaulting to AuditError.
pub type Result<T, E = AuditError> = std::result::Result<T, E>;

/// Primary error type for audit operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    // === Input Errors ===
    #[error("Invalid coordinate ({lat}, {lon}): latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid radius: {0}")]
    InvalidRadius(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    // === Data Errors ===
    #[error("No cloud-free imagery for year {year} below {threshold_pct}% cloud cover")]
    NoCloudFreeImagery { year: i32, threshold_pct: f64 },

    #[error("Region contains no valid pixels")]
    EmptyRegion,

    // === Collaborator Errors ===
    #[error("Request to {0} timed out")]
    ProviderTimeout(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // === Internal Errors ===
    #[error("Raster extents differ: {left} vs {right}")]
    MismatchedExtent { left: String, right: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse grouping used by presentation layers to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request itself was malformed.
    InvalidInput,
    /// No satellite data exists for this place and time.
    NoData,
    /// A collaborator failed transiently; the request may be retried.
    TryAgain,
    /// An invariant was violated.
    Internal,
}

impl AuditError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AuditError::InvalidCoordinate { .. } => "InvalidCoordinate",
            AuditError::InvalidRadius(_) => "InvalidRadius",
            AuditError::LocationNotFound(_) => "LocationNotFound",
            AuditError::NoCloudFreeImagery { .. } => "NoCloudFreeImagery",
            AuditError::EmptyRegion => "EmptyRegion",
            AuditError::ProviderTimeout(_) => "ProviderTimeout",
            AuditError::ProviderUnavailable(_) | AuditError::Storage(_) => "ProviderUnavailable",
            AuditError::MismatchedExtent { .. } => "MismatchedExtent",
            AuditError::InvalidConfig(_) => "InvalidConfig",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AuditError::InvalidCoordinate { .. } | AuditError::InvalidRadius(_) => {
                ErrorCategory::InvalidInput
            }

            AuditError::LocationNotFound(_)
            | AuditError::NoCloudFreeImagery { .. }
            | AuditError::EmptyRegion => ErrorCategory::NoData,

            AuditError::ProviderTimeout(_)
            | AuditError::ProviderUnavailable(_)
            | AuditError::Storage(_) => ErrorCategory::TryAgain,

            AuditError::MismatchedExtent { .. } | AuditError::InvalidConfig(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Whether a bounded retry with backoff may succeed.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::TryAgain
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AuditError::InvalidCoordinate { .. } | AuditError::InvalidRadius(_) => 400,

            AuditError::LocationNotFound(_) => 404,

            AuditError::NoCloudFreeImagery { .. } | AuditError::EmptyRegion => 422,

            AuditError::ProviderUnavailable(_) | AuditError::Storage(_) => 503,
            AuditError::ProviderTimeout(_) => 504,

            AuditError::MismatchedExtent { .. } | AuditError::InvalidConfig(_) => 500,
        }
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        AuditError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Storage(format!("JSON error: {}", err))
    }
}

/// Pipeline stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AuditStage {
    Geocode,
    Region,
    Composite { year: i32 },
    Index { year: i32 },
    Score { year: i32 },
    Classify,
}

impl fmt::Display for AuditStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStage::Geocode => write!(f, "geocode"),
            AuditStage::Region => write!(f, "region"),
            AuditStage::Composite { year } => write!(f, "composite[{}]", year),
            AuditStage::Index { year } => write!(f, "index[{}]", year),
            AuditStage::Score { year } => write!(f, "score[{}]", year),
            AuditStage::Classify => write!(f, "classify"),
        }
    }
}

/// A failed audit: the error plus the stage that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: AuditStage,
    #[source]
    pub source: AuditError,
}

impl StageError {
    pub fn new(stage: AuditStage, source: AuditError) -> Self {
        Self { stage, source }
    }

    pub fn category(&self) -> ErrorCategory {
        self.source.category()
    }
}

/// Attach a stage to a bare `Result`.
pub trait AtStage<T> {
    fn at_stage(self, stage: AuditStage) -> Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at_stage(self, stage: AuditStage) -> Result<T, StageError> {
        self.map_err(|source| StageError::new(stage, source))
    }
}
