//! Vegetation-change analysis pipeline.
//!
//! Compares two yearly, cloud-filtered median composites over a circular
//! region and derives:
//!
//! - **Green scores**: the regional mean NDVI rescaled to 0-100, per year
//! - **Change map**: per-pixel index delta labeled gain, loss or stable
//! - **Summary**: relative change and a human-readable change label
//!
//! # Architecture
//!
//! ```text
//! AuditOrchestrator::run_audit(coordinate, radius_km, persona)
//!      │
//!      ├─► Region::build (radius clamped to the persona range)
//!      │
//!      ├─► CompositeProvider::get_composite ×2 (concurrent)
//!      │         │
//!      │         └─► RetryingProvider ─► MedianCompositor ─► SceneArchive
//!      │
//!      ├─► compute_index ×2 ─► normalize ×2
//!      │
//!      └─► ChangeClassifier::classify
//!               │
//!               ▼
//!          AuditResult ─► AuditResult::view(policy) ─► AuditView
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vegetation::{AnalysisConfig, AuditOrchestrator, InMemorySceneArchive, MedianCompositor};
//!
//! let config = Arc::new(AnalysisConfig::from_env());
//! let compositor = MedianCompositor::new(archive, config.pixel_size_m, config.max_grid_dim);
//! let orchestrator = AuditOrchestrator::new(compositor, config.clone());
//!
//! let result = orchestrator.run_audit(coordinate, 10.0, Persona::Scientist).await?;
//! let view = result.view(config.policy(Persona::Scientist)?);
//! ```

pub mod change;
pub mod composite;
pub mod config;
pub mod index;
pub mod orchestrator;
pub mod provider;
pub mod region;
pub mod retry;
pub mod score;
pub mod types;
pub mod view;

// Re-export commonly used types at crate root
pub use change::{ChangeClassifier, ChangeMap, ChangeStatistics, PixelChange, DEFAULT_NOISE_FLOOR};
pub use composite::{median, MedianCompositor};
pub use config::{AnalysisConfig, PersonaPolicy, RadiusRange};
pub use index::{compute_index, normalized_difference};
pub use orchestrator::{
    AuditOrchestrator, AuditResult, AuditSummary, ChangeLabel, TrendPoint, TrendSeries,
};
pub use provider::{CompositeProvider, InMemorySceneArchive, Scene, SceneArchive};
pub use region::Region;
pub use retry::{RetryPolicy, RetryingProvider};
pub use score::{mean_index, normalize, GreenScore};
pub use types::{BandId, Composite, GridExtent, IndexRaster, RasterBand};
pub use view::{AuditView, TrendView};
