//! Green score: the regional mean index rescaled to 0-100.

use audit_common::{AuditError, Result};
use serde::{Deserialize, Serialize};

use crate::types::IndexRaster;

/// A bounded 0-100 vegetation health score for one index raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreenScore {
    /// Score in [0, 100].
    pub score: f64,
    /// Spatial mean of valid index pixels.
    pub mean_index: f64,
    /// Number of pixels contributing to the mean.
    pub valid_pixels: usize,
}

impl GreenScore {
    /// Linear rescale of a mean index from [-1, 1] to [0, 100].
    pub fn from_mean_index(mean_index: f64, valid_pixels: usize) -> Self {
        let score = ((mean_index + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0);
        Self {
            score,
            mean_index,
            valid_pixels,
        }
    }
}

/// Mean over valid pixels; `EmptyRegion` when every pixel is no-data.
pub fn mean_index(raster: &IndexRaster) -> Result<(f64, usize)> {
    let (sum, count) = raster
        .valid_values()
        .fold((0.0f64, 0usize), |(sum, count), v| (sum + v as f64, count + 1));

    if count == 0 {
        return Err(AuditError::EmptyRegion);
    }
    Ok((sum / count as f64, count))
}

/// Normalize an index raster into a green score.
pub fn normalize(raster: &IndexRaster) -> Result<GreenScore> {
    let (mean, count) = mean_index(raster)?;
    Ok(GreenScore::from_mean_index(mean, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridExtent;
    use audit_common::{AuditYear, BoundingBox};

    fn raster(values: Vec<Option<f32>>) -> IndexRaster {
        let extent = GridExtent::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), values.len(), 1, 30.0);
        IndexRaster::new(AuditYear(2014), extent, values).unwrap()
    }

    #[test]
    fn test_mean_excludes_nodata() {
        let score = normalize(&raster(vec![Some(0.5), None, Some(0.0), None])).unwrap();
        assert!((score.mean_index - 0.25).abs() < 1e-9);
        assert_eq!(score.valid_pixels, 2);
        assert!((score.score - 62.5).abs() < 1e-9);
    }

    #[test]
    fn test_all_nodata_is_empty_region() {
        assert_eq!(normalize(&raster(vec![None, None])), Err(AuditError::EmptyRegion));
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(normalize(&raster(vec![Some(-1.0)])).unwrap().score, 0.0);
        assert_eq!(normalize(&raster(vec![Some(1.0)])).unwrap().score, 100.0);
        assert_eq!(normalize(&raster(vec![Some(0.0)])).unwrap().score, 50.0);
    }

    #[test]
    fn test_score_is_monotonic() {
        let means = [-0.9, -0.3, 0.0, 0.1, 0.45, 0.8];
        for pair in means.windows(2) {
            let lo = GreenScore::from_mean_index(pair[0], 1);
            let hi = GreenScore::from_mean_index(pair[1], 1);
            assert!(hi.score > lo.score);
        }
    }
}
