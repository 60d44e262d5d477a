//! Normalized difference vegetation index.
//!
//! `index = (NIR - RED) / (NIR + RED)`
//!
//! Pixels where either band is missing, or where `NIR + RED == 0`, carry
//! no information and become no-data. Values pushed outside [-1, 1] by
//! sensor noise (e.g. slightly negative reflectance) are clamped.

use audit_common::Result;
use rayon::prelude::*;
use tracing::debug;

use crate::types::{BandId, Composite, IndexRaster};

/// Compute the vegetation index raster for a composite.
///
/// A composite lacking the NIR or red band yields an all-no-data raster;
/// scoring then reports `EmptyRegion`.
pub fn compute_index(composite: &Composite) -> Result<IndexRaster> {
    let extent = composite.extent;
    let (nir, red) = match (composite.band(BandId::Nir), composite.band(BandId::Red)) {
        (Some(nir), Some(red)) => (nir, red),
        _ => {
            debug!(year = composite.year.0, "Composite lacks NIR or red band");
            return IndexRaster::new(composite.year, extent, vec![None; extent.len()]);
        }
    };

    extent.ensure_same(&nir.extent)?;
    extent.ensure_same(&red.extent)?;

    let values: Vec<Option<f32>> = nir
        .data
        .par_iter()
        .zip(red.data.par_iter())
        .map(|(n, r)| match (n, r) {
            (Some(n), Some(r)) => normalized_difference(*n, *r),
            _ => None,
        })
        .collect();

    IndexRaster::new(composite.year, extent, values)
}

/// Normalized difference of two reflectances, clamped to [-1, 1].
pub fn normalized_difference(nir: f32, red: f32) -> Option<f32> {
    let (nir, red) = (nir as f64, red as f64);
    let sum = nir + red;
    if sum == 0.0 {
        return None;
    }
    let index = (nir - red) / sum;
    if !index.is_finite() {
        return None;
    }
    Some(index.clamp(-1.0, 1.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GridExtent, RasterBand};
    use audit_common::{AuditYear, BoundingBox};

    fn extent() -> GridExtent {
        GridExtent::new(BoundingBox::new(0.0, 0.0, 2.0, 1.0), 2, 1, 30.0)
    }

    #[test]
    fn test_equal_bands_give_zero() {
        assert_eq!(normalized_difference(0.3, 0.3), Some(0.0));
    }

    #[test]
    fn test_zero_red_gives_one() {
        assert_eq!(normalized_difference(0.4, 0.0), Some(1.0));
    }

    #[test]
    fn test_zero_sum_is_nodata_not_nan() {
        assert_eq!(normalized_difference(0.0, 0.0), None);
        assert_eq!(normalized_difference(0.1, -0.1), None);
    }

    #[test]
    fn test_noise_is_clamped() {
        // Negative red reflectance pushes the ratio above 1
        assert_eq!(normalized_difference(0.5, -0.1), Some(1.0));
        assert_eq!(normalized_difference(-0.1, 0.5), Some(-1.0));
    }

    #[test]
    fn test_compute_index_propagates_nodata() {
        let nir = RasterBand::new(BandId::Nir, extent(), vec![Some(0.5), None]).unwrap();
        let red = RasterBand::new(BandId::Red, extent(), vec![Some(0.1), Some(0.1)]).unwrap();
        let composite = Composite::new(AuditYear(2014), 60.0, 3, extent())
            .with_band(nir)
            .unwrap()
            .with_band(red)
            .unwrap();

        let index = compute_index(&composite).unwrap();
        assert_eq!(index.values.len(), 2);
        assert!((index.values[0].unwrap() - 0.6667).abs() < 1e-3);
        assert_eq!(index.values[1], None);
        assert_eq!(index.year, AuditYear(2014));
    }

    #[test]
    fn test_missing_band_gives_all_nodata() {
        let nir = RasterBand::filled(BandId::Nir, extent(), Some(0.5));
        let composite = Composite::new(AuditYear(2024), 60.0, 1, extent())
            .with_band(nir)
            .unwrap();
        let index = compute_index(&composite).unwrap();
        assert_eq!(index.valid_count(), 0);
    }
}
