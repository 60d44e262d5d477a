//! Cloud-filtered median compositing over a scene archive.

use async_trait::async_trait;
use audit_common::{AuditError, AuditYear, Result};
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::provider::{CompositeProvider, Scene, SceneArchive};
use crate::region::Region;
use crate::types::{BandId, Composite, GridExtent, RasterBand};

/// Builds yearly composites by taking the per-pixel median of every scene
/// that passes the cloud filter.
///
/// The region grid depends only on the region and this compositor's pixel
/// settings, so two calls with the same region yield identical extents.
pub struct MedianCompositor<A> {
    archive: A,
    pixel_size_m: f64,
    max_grid_dim: usize,
}

impl<A: SceneArchive> MedianCompositor<A> {
    pub fn new(archive: A, pixel_size_m: f64, max_grid_dim: usize) -> Self {
        Self {
            archive,
            pixel_size_m,
            max_grid_dim,
        }
    }

    /// Grid used for composites of `region`.
    pub fn grid_for(&self, region: &Region) -> GridExtent {
        region.grid(self.pixel_size_m, self.max_grid_dim)
    }
}

#[async_trait]
impl<A: SceneArchive> CompositeProvider for MedianCompositor<A> {
    #[instrument(skip(self, region), fields(center = %region.center(), radius_km = region.radius_km()))]
    async fn get_composite(
        &self,
        region: &Region,
        year: AuditYear,
        cloud_threshold_pct: f64,
    ) -> Result<Composite> {
        let window = year.window();
        let candidates = self.archive.scenes(&region.bbox(), &window).await?;
        let total = candidates.len();

        let eligible: Vec<Scene> = candidates
            .into_iter()
            .filter(|s| s.cloud_cover_pct <= cloud_threshold_pct)
            .collect();

        debug!(
            year = year.0,
            total,
            eligible = eligible.len(),
            "Filtered scenes by cloud cover"
        );

        if eligible.is_empty() {
            return Err(AuditError::NoCloudFreeImagery {
                year: year.0,
                threshold_pct: cloud_threshold_pct,
            });
        }

        let extent = self.grid_for(region);
        let mask = disc_mask(region, &extent);

        let mut composite = Composite::new(year, cloud_threshold_pct, eligible.len(), extent);
        for band in BandId::ALL {
            let sources: Vec<&RasterBand> = eligible.iter().filter_map(|s| s.band(band)).collect();
            if sources.is_empty() {
                continue;
            }
            composite = composite.with_band(median_band(band, &extent, &mask, &sources))?;
        }

        Ok(composite)
    }
}

/// Per-pixel flag: true where the cell center lies inside the region disc.
fn disc_mask(region: &Region, extent: &GridExtent) -> Vec<bool> {
    (0..extent.len())
        .into_par_iter()
        .map(|i| {
            let (lon, lat) = extent.cell_center(i % extent.width, i / extent.width);
            region.contains(lon, lat)
        })
        .collect()
}

fn median_band(
    band: BandId,
    extent: &GridExtent,
    mask: &[bool],
    sources: &[&RasterBand],
) -> RasterBand {
    let data: Vec<Option<f32>> = (0..extent.len())
        .into_par_iter()
        .map(|i| {
            if !mask[i] {
                return None;
            }
            let (lon, lat) = extent.cell_center(i % extent.width, i / extent.width);
            let mut samples: Vec<f32> = sources
                .iter()
                .filter_map(|src| src.sample(lon, lat))
                .filter(|v| v.is_finite())
                .collect();
            median(&mut samples)
        })
        .collect();

    RasterBand {
        band,
        extent: *extent,
        data,
    }
}

/// Median of the values; mean of the two middle values for even counts.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}
