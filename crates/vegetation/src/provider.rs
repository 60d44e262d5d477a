//! Composite provider and scene archive contracts.
//!
//! ```text
//! Region + year + cloud threshold
//!      │
//!      ▼
//! CompositeProvider::get_composite
//!      │
//!      └─► MedianCompositor
//!               │
//!               ├─► SceneArchive::scenes(bbox, year window)
//!               ├─► drop scenes above the cloud threshold
//!               └─► per-pixel median onto the region grid
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use audit_common::{AuditYear, BoundingBox, Result, YearWindow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::region::Region;
use crate::types::{BandId, Composite, RasterBand};

/// Source of yearly composites for a region.
///
/// Implementations must fail with `NoCloudFreeImagery` when no scene passes
/// the cloud filter rather than returning an empty composite.
#[async_trait]
pub trait CompositeProvider: Send + Sync {
    async fn get_composite(
        &self,
        region: &Region,
        year: AuditYear,
        cloud_threshold_pct: f64,
    ) -> Result<Composite>;
}

#[async_trait]
impl<P: CompositeProvider + ?Sized> CompositeProvider for Arc<P> {
    async fn get_composite(
        &self,
        region: &Region,
        year: AuditYear,
        cloud_threshold_pct: f64,
    ) -> Result<Composite> {
        (**self).get_composite(region, year, cloud_threshold_pct).await
    }
}

/// A single acquisition with its scene-level cloud estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub acquired: NaiveDate,
    /// Estimated cloud cover over the whole scene, 0-100.
    pub cloud_cover_pct: f64,
    pub bands: Vec<RasterBand>,
}

impl Scene {
    pub fn band(&self, id: BandId) -> Option<&RasterBand> {
        self.bands.iter().find(|b| b.band == id)
    }

    /// Union of the band footprints.
    pub fn footprint(&self) -> Option<BoundingBox> {
        self.bands.iter().map(|b| b.extent.bbox).reduce(|a, b| {
            BoundingBox::new(
                a.min_lon.min(b.min_lon),
                a.min_lat.min(b.min_lat),
                a.max_lon.max(b.max_lon),
                a.max_lat.max(b.max_lat),
            )
        })
    }
}

/// Catalog of raw scenes.
#[async_trait]
pub trait SceneArchive: Send + Sync {
    /// Scenes intersecting `bbox` acquired within `window`.
    async fn scenes(&self, bbox: &BoundingBox, window: &YearWindow) -> Result<Vec<Scene>>;
}

/// Scene archive held in memory, for tests and local demos.
#[derive(Debug, Default)]
pub struct InMemorySceneArchive {
    scenes: RwLock<Vec<Scene>>,
}

impl InMemorySceneArchive {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self {
            scenes: RwLock::new(scenes),
        }
    }

    pub async fn insert(&self, scene: Scene) {
        self.scenes.write().await.push(scene);
    }

    pub async fn len(&self) -> usize {
        self.scenes.read().await.len()
    }
}

#[async_trait]
impl SceneArchive for InMemorySceneArchive {
    async fn scenes(&self, bbox: &BoundingBox, window: &YearWindow) -> Result<Vec<Scene>> {
        let scenes = self.scenes.read().await;
        Ok(scenes
            .iter()
            .filter(|s| window.contains(s.acquired))
            .filter(|s| s.footprint().map_or(false, |f| f.intersects(bbox)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridExtent;

    fn scene(id: &str, date: (i32, u32, u32), bbox: BoundingBox) -> Scene {
        let extent = GridExtent::new(bbox, 2, 2, 30.0);
        Scene {
            id: id.to_string(),
            acquired: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            cloud_cover_pct: 10.0,
            bands: vec![RasterBand::filled(BandId::Nir, extent, Some(0.4))],
        }
    }

    #[tokio::test]
    async fn test_in_memory_archive_filters_by_window_and_bbox() {
        let here = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let elsewhere = BoundingBox::new(50.0, 50.0, 51.0, 51.0);
        let archive = InMemorySceneArchive::new(vec![
            scene("a", (2014, 3, 1), here),
            scene("b", (2015, 1, 1), here),
            scene("c", (2014, 6, 1), elsewhere),
        ]);

        let found = archive
            .scenes(&BoundingBox::new(0.2, 0.2, 0.8, 0.8), &AuditYear(2014).window())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
        assert_eq!(archive.len().await, 3);
    }
}
