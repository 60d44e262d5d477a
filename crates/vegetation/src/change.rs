//! Pixel-level vegetation change between two index rasters.
//!
//! `delta = later - earlier`, so a positive delta is vegetation gain. A pixel
//! is labeled gain when `delta > ε`, loss when `delta < -ε`, and stable
//! otherwise; a delta of exactly ±ε is stable.

use audit_common::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{GridExtent, IndexRaster};

/// Default noise floor on the index scale.
pub const DEFAULT_NOISE_FLOOR: f64 = 0.05;

/// Per-pixel change class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelChange {
    Gain,
    Loss,
    Stable,
}

/// Aggregate change over the valid pixels of a change map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatistics {
    /// Pixels valid in both inputs.
    pub valid_pixels: usize,
    pub gain_fraction: f64,
    pub loss_fraction: f64,
    pub stable_fraction: f64,
    /// Mean per-pixel delta; `None` when no pixel is valid in both years.
    pub mean_delta: Option<f64>,
}

/// Classified difference of two index rasters on the same grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeMap {
    pub extent: GridExtent,
    /// Noise floor used for labeling.
    pub noise_floor: f64,
    /// Per-pixel `later - earlier`; `None` where either input is no-data.
    pub delta: Vec<Option<f32>>,
    /// Per-pixel label; `None` exactly where `delta` is `None`.
    pub labels: Vec<Option<PixelChange>>,
    pub statistics: ChangeStatistics,
}

/// Labels per-pixel index change against a noise floor.
#[derive(Debug, Clone, Copy)]
pub struct ChangeClassifier {
    noise_floor: f64,
}

impl Default for ChangeClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_FLOOR)
    }
}

impl ChangeClassifier {
    pub fn new(noise_floor: f64) -> Self {
        Self { noise_floor }
    }

    pub fn noise_floor(&self) -> f64 {
        self.noise_floor
    }

    /// Label a single delta.
    ///
    /// Compared in `f32`, the precision of index rasters, so a delta that
    /// equals the floor after rounding stays stable.
    pub fn label(&self, delta: f32) -> PixelChange {
        let floor = self.noise_floor as f32;
        if delta > floor {
            PixelChange::Gain
        } else if delta < -floor {
            PixelChange::Loss
        } else {
            PixelChange::Stable
        }
    }

    /// Classify change from `earlier` to `later`.
    ///
    /// Both rasters must share the same extent; otherwise this fails with
    /// `MismatchedExtent`.
    pub fn classify(&self, earlier: &IndexRaster, later: &IndexRaster) -> Result<ChangeMap> {
        earlier.extent.ensure_same(&later.extent)?;

        let (delta, labels): (Vec<Option<f32>>, Vec<Option<PixelChange>>) = earlier
            .values
            .par_iter()
            .zip(later.values.par_iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => {
                    let d = b - a;
                    (Some(d), Some(self.label(d)))
                }
                _ => (None, None),
            })
            .unzip();

        let statistics = summarize(&delta, &labels);

        Ok(ChangeMap {
            extent: earlier.extent,
            noise_floor: self.noise_floor,
            delta,
            labels,
            statistics,
        })
    }
}

fn summarize(delta: &[Option<f32>], labels: &[Option<PixelChange>]) -> ChangeStatistics {
    let (mut gain, mut loss, mut stable) = (0usize, 0usize, 0usize);
    for label in labels.iter().flatten() {
        match label {
            PixelChange::Gain => gain += 1,
            PixelChange::Loss => loss += 1,
            PixelChange::Stable => stable += 1,
        }
    }

    let valid = gain + loss + stable;
    if valid == 0 {
        return ChangeStatistics {
            valid_pixels: 0,
            gain_fraction: 0.0,
            loss_fraction: 0.0,
            stable_fraction: 0.0,
            mean_delta: None,
        };
    }

    let sum: f64 = delta.iter().flatten().map(|d| *d as f64).sum();
    let n = valid as f64;
    ChangeStatistics {
        valid_pixels: valid,
        gain_fraction: gain as f64 / n,
        loss_fraction: loss as f64 / n,
        stable_fraction: stable as f64 / n,
        mean_delta: Some(sum / n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_common::{AuditError, AuditYear, BoundingBox};

    fn raster(year: i32, values: Vec<Option<f32>>) -> IndexRaster {
        let extent = GridExtent::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), values.len(), 1, 30.0);
        IndexRaster::new(AuditYear(year), extent, values).unwrap()
    }

    #[test]
    fn test_labels_and_statistics() {
        let a = raster(2014, vec![Some(0.2), Some(0.5), Some(0.3), None, Some(0.1)]);
        let b = raster(2024, vec![Some(0.6), Some(0.1), Some(0.31), Some(0.4), None]);
        let map = ChangeClassifier::default().classify(&a, &b).unwrap();

        assert_eq!(
            map.labels,
            vec![
                Some(PixelChange::Gain),
                Some(PixelChange::Loss),
                Some(PixelChange::Stable),
                None,
                None
            ]
        );
        assert_eq!(map.statistics.valid_pixels, 3);
        assert!((map.statistics.gain_fraction - 1.0 / 3.0).abs() < 1e-9);
        assert!((map.statistics.loss_fraction - 1.0 / 3.0).abs() < 1e-9);
        let mean = map.statistics.mean_delta.unwrap();
        assert!((mean - (0.4 - 0.4 + 0.01) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_boundary_is_stable() {
        let classifier = ChangeClassifier::new(0.25);
        let a = raster(2014, vec![Some(0.25), Some(0.5)]);
        let b = raster(2024, vec![Some(0.5), Some(0.25)]);
        let map = classifier.classify(&a, &b).unwrap();
        assert_eq!(map.delta, vec![Some(0.25), Some(-0.25)]);
        assert_eq!(
            map.labels,
            vec![Some(PixelChange::Stable), Some(PixelChange::Stable)]
        );
    }

    #[test]
    fn test_default_floor_boundary_is_stable() {
        let a = raster(2014, vec![Some(0.0), Some(0.05), Some(0.30)]);
        let b = raster(2024, vec![Some(0.05), Some(0.0), Some(0.35)]);
        let map = ChangeClassifier::default().classify(&a, &b).unwrap();
        assert_eq!(
            map.labels,
            vec![
                Some(PixelChange::Stable),
                Some(PixelChange::Stable),
                Some(PixelChange::Stable)
            ]
        );
        assert_eq!(map.statistics.stable_fraction, 1.0);
    }

    #[test]
    fn test_label_just_past_floor() {
        let classifier = ChangeClassifier::default();
        assert_eq!(classifier.label(0.05), PixelChange::Stable);
        assert_eq!(classifier.label(-0.05), PixelChange::Stable);
        assert_eq!(classifier.label(0.051), PixelChange::Gain);
        assert_eq!(classifier.label(-0.051), PixelChange::Loss);
    }

    #[test]
    fn test_delta_is_antisymmetric() {
        let a = raster(2014, vec![Some(0.12), Some(-0.4), None, Some(0.9)]);
        let b = raster(2024, vec![Some(0.7), Some(-0.35), Some(0.2), Some(0.1)]);
        let classifier = ChangeClassifier::default();
        let ab = classifier.classify(&a, &b).unwrap();
        let ba = classifier.classify(&b, &a).unwrap();
        for (x, y) in ab.delta.iter().zip(ba.delta.iter()) {
            assert_eq!(*x, y.map(|v| -v));
        }
    }

    #[test]
    fn test_mismatched_extent() {
        let a = raster(2014, vec![Some(0.1), Some(0.2)]);
        let b = raster(2024, vec![Some(0.1), Some(0.2), Some(0.3)]);
        let err = ChangeClassifier::default().classify(&a, &b).unwrap_err();
        assert!(matches!(err, AuditError::MismatchedExtent { .. }));
    }

    #[test]
    fn test_no_overlap_has_no_mean() {
        let a = raster(2014, vec![Some(0.1), None]);
        let b = raster(2024, vec![None, Some(0.2)]);
        let map = ChangeClassifier::default().classify(&a, &b).unwrap();
        assert_eq!(map.statistics.valid_pixels, 0);
        assert_eq!(map.statistics.mean_delta, None);
    }
}
