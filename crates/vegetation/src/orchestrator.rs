//! Audit orchestration.
//!
//! ```text
//! coordinate + radius + persona
//!      │
//!      ▼
//! Region::build ──────────────► Region
//!      │
//!      ├─► get_composite(baseline) ─┐   concurrent, each bounded
//!      └─► get_composite(target)  ──┤   by the provider timeout
//!                                   ▼
//!                      compute_index ×2 → normalize ×2
//!                                   │
//!                                   ▼
//!                      ChangeClassifier::classify → AuditResult
//! ```
//!
//! Every failure is tagged with the stage that raised it. No partial
//! result is ever returned.

use std::sync::Arc;

use audit_common::{
    AtStage, AuditError, AuditStage, AuditYear, Coordinate, Persona, Result, StageError,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::change::{ChangeClassifier, ChangeMap};
use crate::config::AnalysisConfig;
use crate::index::compute_index;
use crate::provider::CompositeProvider;
use crate::region::Region;
use crate::score::{mean_index, normalize, GreenScore};
use crate::types::Composite;

/// Years of a trend series fetched concurrently.
const TREND_CONCURRENCY: usize = 4;

/// Direction of the regional change between the two years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeLabel {
    Gain,
    Loss,
    NoChange,
}

/// Region-wide summary of the index change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub mean_index_a: f64,
    pub mean_index_b: f64,
    /// `mean_index_b - mean_index_a`.
    pub index_delta: f64,
    /// Change relative to the baseline magnitude; `None` for a zero baseline.
    pub relative_change_pct: Option<f64>,
    pub change_label: ChangeLabel,
}

impl AuditSummary {
    pub fn from_scores(baseline: &GreenScore, target: &GreenScore) -> Self {
        let index_delta = target.mean_index - baseline.mean_index;
        let relative_change_pct = if baseline.mean_index == 0.0 {
            None
        } else {
            Some(index_delta / baseline.mean_index.abs() * 100.0)
        };

        let change_label = if index_delta > 0.0 {
            ChangeLabel::Gain
        } else if index_delta < 0.0 {
            ChangeLabel::Loss
        } else {
            ChangeLabel::NoChange
        };

        Self {
            mean_index_a: baseline.mean_index,
            mean_index_b: target.mean_index,
            index_delta,
            relative_change_pct,
            change_label,
        }
    }

    /// Human-readable label, e.g. "12.5% Vegetation Gain".
    pub fn describe(&self) -> String {
        let direction = match self.change_label {
            ChangeLabel::Gain => "Gain",
            ChangeLabel::Loss => "Loss",
            ChangeLabel::NoChange => return "No significant change".to_string(),
        };
        match self.relative_change_pct {
            Some(pct) => format!("{:.1}% Vegetation {}", pct.abs(), direction),
            None => format!("Vegetation {}", direction),
        }
    }
}

/// The complete outcome of one audit.
///
/// Computed identically for every persona; see [`crate::view`] for the
/// persona projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub audit_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub persona: Persona,
    pub region: Region,
    pub baseline_year: AuditYear,
    pub target_year: AuditYear,
    pub baseline_score: GreenScore,
    pub target_score: GreenScore,
    /// `target_score - baseline_score` on the 0-100 scale.
    pub delta: f64,
    pub summary: AuditSummary,
    pub change_map: ChangeMap,
}

/// Mean index for one year of a trend series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: AuditYear,
    /// `None` when the year has no usable imagery.
    pub mean_index: Option<f64>,
    pub green_score: Option<f64>,
    pub valid_pixels: usize,
}

impl TrendPoint {
    fn missing(year: AuditYear) -> Self {
        Self {
            year,
            mean_index: None,
            green_score: None,
            valid_pixels: 0,
        }
    }
}

/// Yearly mean index over one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub persona: Persona,
    pub region: Region,
    pub cloud_threshold_pct: f64,
    pub points: Vec<TrendPoint>,
}

/// Sequences region, composite, index, score and change stages.
pub struct AuditOrchestrator<P> {
    provider: P,
    config: Arc<AnalysisConfig>,
    classifier: ChangeClassifier,
}

impl<P: CompositeProvider> AuditOrchestrator<P> {
    pub fn new(provider: P, config: Arc<AnalysisConfig>) -> Self {
        let classifier = ChangeClassifier::new(config.noise_floor);
        Self {
            provider,
            config,
            classifier,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Build the region for a request, clamping the radius to the persona range.
    pub fn build_region(
        &self,
        coordinate: Coordinate,
        radius_km: f64,
        persona: Persona,
    ) -> Result<Region, StageError> {
        let policy = self.config.policy(persona).at_stage(AuditStage::Region)?;
        Region::build(coordinate, radius_km, &policy.radius).at_stage(AuditStage::Region)
    }

    /// Run a full two-year audit.
    #[instrument(skip(self, coordinate, persona), fields(%coordinate, %persona))]
    pub async fn run_audit(
        &self,
        coordinate: Coordinate,
        radius_km: f64,
        persona: Persona,
    ) -> Result<AuditResult, StageError> {
        let region = self.build_region(coordinate, radius_km, persona)?;
        let (baseline_year, target_year) = (self.config.baseline_year, self.config.target_year);

        // A failure in either year drops the other
        let (baseline, target) = tokio::try_join!(
            self.fetch(&region, baseline_year),
            self.fetch(&region, target_year)
        )?;

        let index_a = compute_index(&baseline).at_stage(AuditStage::Index {
            year: baseline_year.0,
        })?;
        let index_b = compute_index(&target).at_stage(AuditStage::Index {
            year: target_year.0,
        })?;

        let baseline_score = normalize(&index_a).at_stage(AuditStage::Score {
            year: baseline_year.0,
        })?;
        let target_score = normalize(&index_b).at_stage(AuditStage::Score {
            year: target_year.0,
        })?;

        let change_map = self
            .classifier
            .classify(&index_a, &index_b)
            .at_stage(AuditStage::Classify)?;

        let summary = AuditSummary::from_scores(&baseline_score, &target_score);
        let delta = target_score.score - baseline_score.score;

        info!(
            radius_km = region.radius_km(),
            baseline_score = baseline_score.score,
            target_score = target_score.score,
            delta,
            gain_fraction = change_map.statistics.gain_fraction,
            loss_fraction = change_map.statistics.loss_fraction,
            "Audit complete"
        );

        Ok(AuditResult {
            audit_id: Uuid::new_v4(),
            created_at: Utc::now(),
            persona,
            region,
            baseline_year,
            target_year,
            baseline_score,
            target_score,
            delta,
            summary,
            change_map,
        })
    }

    /// Mean index for each year in `from..=to` over the same region.
    ///
    /// Years without usable imagery appear with `mean_index: None`; any
    /// other failure aborts the series.
    #[instrument(skip(self, coordinate, persona, from, to), fields(%coordinate, %persona, from = from.0, to = to.0))]
    pub async fn run_trend(
        &self,
        coordinate: Coordinate,
        radius_km: f64,
        persona: Persona,
        from: AuditYear,
        to: AuditYear,
    ) -> Result<TrendSeries, StageError> {
        let region = self.build_region(coordinate, radius_km, persona)?;

        let points: Vec<TrendPoint> = stream::iter(from.through(to))
            .map(|year| self.trend_point(&region, year))
            .buffered(TREND_CONCURRENCY)
            .try_collect()
            .await?;

        let available = points.iter().filter(|p| p.mean_index.is_some()).count();
        info!(years = points.len(), available, "Trend complete");

        Ok(TrendSeries {
            persona,
            region,
            cloud_threshold_pct: self.config.cloud_threshold_pct,
            points,
        })
    }

    /// One year's composite over the request region, e.g. a timelapse frame.
    #[instrument(skip(self, coordinate, persona, year), fields(%coordinate, %persona, year = year.0))]
    pub async fn get_composite(
        &self,
        coordinate: Coordinate,
        radius_km: f64,
        persona: Persona,
        year: AuditYear,
    ) -> Result<Composite, StageError> {
        let region = self.build_region(coordinate, radius_km, persona)?;
        self.fetch(&region, year).await
    }

    async fn trend_point(&self, region: &Region, year: AuditYear) -> Result<TrendPoint, StageError> {
        let composite = match self.fetch(region, year).await {
            Ok(composite) => composite,
            Err(e) if matches!(e.source, AuditError::NoCloudFreeImagery { .. }) => {
                debug!(year = year.0, "No imagery for trend year");
                return Ok(TrendPoint::missing(year));
            }
            Err(e) => return Err(e),
        };

        let index = compute_index(&composite).at_stage(AuditStage::Index { year: year.0 })?;
        match mean_index(&index) {
            Ok((mean, valid_pixels)) => Ok(TrendPoint {
                year,
                mean_index: Some(mean),
                green_score: Some(GreenScore::from_mean_index(mean, valid_pixels).score),
                valid_pixels,
            }),
            Err(AuditError::EmptyRegion) => {
                debug!(year = year.0, "Trend year has no valid pixels");
                Ok(TrendPoint::missing(year))
            }
            Err(e) => Err(StageError::new(AuditStage::Score { year: year.0 }, e)),
        }
    }

    async fn fetch(&self, region: &Region, year: AuditYear) -> Result<Composite, StageError> {
        let timeout = self.config.provider_timeout();
        let call = self
            .provider
            .get_composite(region, year, self.config.cloud_threshold_pct);

        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(year = year.0, timeout_secs = timeout.as_secs(), "Composite request timed out");
                Err(AuditError::ProviderTimeout(format!(
                    "composite provider for {}",
                    year
                )))
            }
        };

        let composite = result.at_stage(AuditStage::Composite { year: year.0 })?;
        debug!(
            year = year.0,
            scenes = composite.scene_count,
            extent = %composite.extent,
            "Fetched composite"
        );
        Ok(composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(mean: f64) -> GreenScore {
        GreenScore::from_mean_index(mean, 10)
    }

    #[test]
    fn test_summary_gain() {
        let summary = AuditSummary::from_scores(&score(0.4), &score(0.5));
        assert_eq!(summary.change_label, ChangeLabel::Gain);
        assert!((summary.relative_change_pct.unwrap() - 25.0).abs() < 1e-9);
        assert_eq!(summary.describe(), "25.0% Vegetation Gain");
    }

    #[test]
    fn test_summary_loss_uses_baseline_magnitude() {
        let summary = AuditSummary::from_scores(&score(-0.2), &score(-0.3));
        assert_eq!(summary.change_label, ChangeLabel::Loss);
        assert!((summary.relative_change_pct.unwrap() + 50.0).abs() < 1e-9);
        assert_eq!(summary.describe(), "50.0% Vegetation Loss");
    }

    #[test]
    fn test_summary_no_change() {
        let summary = AuditSummary::from_scores(&score(0.3), &score(0.3));
        assert_eq!(summary.change_label, ChangeLabel::NoChange);
        assert_eq!(summary.describe(), "No significant change");
    }

    #[test]
    fn test_summary_zero_baseline_has_no_relative_change() {
        let summary = AuditSummary::from_scores(&score(0.0), &score(0.2));
        assert_eq!(summary.relative_change_pct, None);
        assert_eq!(summary.change_label, ChangeLabel::Gain);
        assert_eq!(summary.describe(), "Vegetation Gain");
    }
}
