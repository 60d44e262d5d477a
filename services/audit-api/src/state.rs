//! Application state for the audit API.

use std::sync::Arc;

use anyhow::{Context, Result};
use scene_store::ObjectStoreSceneArchive;
use tracing::info;
use vegetation::{
    AnalysisConfig, AuditOrchestrator, CompositeProvider, MedianCompositor, RetryingProvider,
};

use crate::config::ServiceConfig;
use crate::geocode::{Geocoder, NominatimGeocoder};

/// Shared application state.
pub struct AppState {
    /// Runs audits, trends and per-year composites.
    pub orchestrator: AuditOrchestrator<Arc<dyn CompositeProvider>>,

    /// Resolves place names.
    pub geocoder: Arc<dyn Geocoder>,

    /// Read-only analysis settings shared with the orchestrator.
    pub analysis: Arc<AnalysisConfig>,
}

impl AppState {
    /// Wire the scene store, compositor and geocoder from configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let analysis = Arc::new(config.analysis.clone());

        let archive = ObjectStoreSceneArchive::from_config(&config.scene_store)
            .context("Failed to open scene store")?;
        let compositor =
            MedianCompositor::new(archive, analysis.pixel_size_m, analysis.max_grid_dim);
        let provider: Arc<dyn CompositeProvider> =
            Arc::new(RetryingProvider::new(compositor, config.retry));

        let geocoder: Arc<dyn Geocoder> = Arc::new(
            NominatimGeocoder::new(&config.geocoder).context("Failed to build geocoder")?,
        );

        info!(
            cloud_threshold_pct = analysis.cloud_threshold_pct,
            noise_floor = analysis.noise_floor,
            baseline_year = analysis.baseline_year.0,
            target_year = analysis.target_year.0,
            "Application state initialized"
        );

        Ok(Self::from_parts(provider, geocoder, analysis))
    }

    /// Assemble state from ready-made collaborators.
    pub fn from_parts(
        provider: Arc<dyn CompositeProvider>,
        geocoder: Arc<dyn Geocoder>,
        analysis: Arc<AnalysisConfig>,
    ) -> Self {
        Self {
            orchestrator: AuditOrchestrator::new(provider, analysis.clone()),
            geocoder,
            analysis,
        }
    }
}
