//! Persona projections of audit results.
//!
//! A view only hides fields; every exposed number is copied unchanged from
//! the single [`AuditResult`], so two personas never see different values
//! for the same field.

use audit_common::{AuditField, AuditYear, Coordinate, Persona};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::change::{ChangeMap, ChangeStatistics};
use crate::config::PersonaPolicy;
use crate::orchestrator::{AuditResult, ChangeLabel, TrendPoint, TrendSeries};

/// The fields of an [`AuditResult`] a persona is allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditView {
    pub audit_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub persona: Persona,
    pub center: Coordinate,
    pub radius_km: f64,
    pub baseline_year: AuditYear,
    pub target_year: AuditYear,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_index_a: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_index_b: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_change_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_label: Option<ChangeLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_statistics: Option<ChangeStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_map: Option<ChangeMap>,
}

impl AuditResult {
    /// Project this result through a persona policy.
    pub fn view(&self, policy: &PersonaPolicy) -> AuditView {
        let show = |field: AuditField| policy.exposes(field);

        let (baseline_score, target_score) = if show(AuditField::Scores) {
            (Some(self.baseline_score.score), Some(self.target_score.score))
        } else {
            (None, None)
        };

        let (mean_index_a, mean_index_b) = if show(AuditField::MeanIndex) {
            (Some(self.summary.mean_index_a), Some(self.summary.mean_index_b))
        } else {
            (None, None)
        };

        let (change_label, change_summary) = if show(AuditField::ChangeLabel) {
            (Some(self.summary.change_label), Some(self.summary.describe()))
        } else {
            (None, None)
        };

        AuditView {
            audit_id: self.audit_id,
            created_at: self.created_at,
            persona: self.persona,
            center: self.region.center(),
            radius_km: self.region.radius_km(),
            baseline_year: self.baseline_year,
            target_year: self.target_year,
            baseline_score,
            target_score,
            delta: show(AuditField::Delta).then_some(self.delta),
            mean_index_a,
            mean_index_b,
            relative_change_pct: if show(AuditField::RelativeChange) {
                self.summary.relative_change_pct
            } else {
                None
            },
            change_label,
            change_summary,
            change_statistics: show(AuditField::ChangeStatistics)
                .then_some(self.change_map.statistics),
            change_map: show(AuditField::ChangeMap).then(|| self.change_map.clone()),
        }
    }
}

/// A trend series as returned to a persona.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendView {
    pub persona: Persona,
    pub center: Coordinate,
    pub radius_km: f64,
    pub cloud_threshold_pct: f64,
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// `None` when the persona may not see trends at all.
    pub fn view(&self, policy: &PersonaPolicy) -> Option<TrendView> {
        if !policy.exposes(AuditField::Trend) {
            return None;
        }
        Some(TrendView {
            persona: self.persona,
            center: self.region.center(),
            radius_km: self.region.radius_km(),
            cloud_threshold_pct: self.cloud_threshold_pct,
            points: self.points.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeClassifier;
    use crate::config::AnalysisConfig;
    use crate::orchestrator::AuditSummary;
    use crate::region::Region;
    use crate::score::GreenScore;
    use crate::types::{GridExtent, IndexRaster};
    use audit_common::BoundingBox;

    fn result(persona: Persona) -> AuditResult {
        let config = AnalysisConfig::default();
        let policy = config.policy(persona).unwrap();
        let region = Region::build(Coordinate::new(10.0, 20.0).unwrap(), 3.0, &policy.radius).unwrap();
        let extent = GridExtent::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 2, 1, 30.0);
        let a = IndexRaster::new(AuditYear(2014), extent, vec![Some(0.2), Some(0.4)]).unwrap();
        let b = IndexRaster::new(AuditYear(2024), extent, vec![Some(0.5), Some(0.4)]).unwrap();
        let baseline_score = GreenScore::from_mean_index(0.3, 2);
        let target_score = GreenScore::from_mean_index(0.45, 2);

        AuditResult {
            audit_id: Uuid::nil(),
            created_at: Utc::now(),
            persona,
            region,
            baseline_year: AuditYear(2014),
            target_year: AuditYear(2024),
            baseline_score,
            target_score,
            delta: target_score.score - baseline_score.score,
            summary: AuditSummary::from_scores(&baseline_score, &target_score),
            change_map: ChangeClassifier::default().classify(&a, &b).unwrap(),
        }
    }

    #[test]
    fn test_scientist_sees_everything() {
        let config = AnalysisConfig::default();
        let view = result(Persona::Scientist).view(config.policy(Persona::Scientist).unwrap());
        assert!(view.baseline_score.is_some());
        assert!(view.mean_index_a.is_some());
        assert!(view.relative_change_pct.is_some());
        assert!(view.change_statistics.is_some());
        assert!(view.change_map.is_some());
    }

    #[test]
    fn test_public_view_omits_detail_fields_from_json() {
        let config = AnalysisConfig::default();
        let view = result(Persona::Public).view(config.policy(Persona::Public).unwrap());
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("baseline_score").is_some());
        assert!(json.get("delta").is_some());
        assert!(json.get("change_summary").is_some());
        assert!(json.get("change_map").is_none());
        assert!(json.get("change_statistics").is_none());
        assert!(json.get("mean_index_a").is_none());
    }

    #[test]
    fn test_numbers_identical_across_personas() {
        let config = AnalysisConfig::default();
        let result = result(Persona::Scientist);
        let views: Vec<AuditView> = Persona::ALL
            .iter()
            .map(|p| result.view(config.policy(*p).unwrap()))
            .collect();

        for view in &views {
            assert_eq!(view.baseline_score, Some(result.baseline_score.score));
            assert_eq!(view.target_score, Some(result.target_score.score));
            assert_eq!(view.delta, Some(result.delta));
        }
    }

    #[test]
    fn test_trend_hidden_from_public() {
        let config = AnalysisConfig::default();
        let result = result(Persona::Public);
        let series = TrendSeries {
            persona: Persona::Public,
            region: result.region.clone(),
            cloud_threshold_pct: 60.0,
            points: vec![],
        };
        assert!(series.view(config.policy(Persona::Public).unwrap()).is_none());
        assert!(series.view(config.policy(Persona::Student).unwrap()).is_some());
    }
}
