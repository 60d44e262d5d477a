//! Scene archive over an object store.
//!
//! Layout:
//!
//! ```text
//! scenes/<year>/<scene_id>/scene.json   manifest
//! scenes/<year>/<scene_id>/<band>.f32   one payload per band
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use audit_common::{AuditError, BoundingBox, Result, YearWindow};
use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use futures::future::try_join_all;
use futures::TryStreamExt;
use object_store::{path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vegetation::{BandId, GridExtent, RasterBand, Scene, SceneArchive};

use crate::codec::{decode_band, encode_band, DEFAULT_NODATA};
use crate::config::SceneStoreConfig;

const ROOT_PREFIX: &str = "scenes";
const MANIFEST_FILE: &str = "scene.json";

/// Metadata stored alongside a scene's band payloads.
///
/// Every band of a stored scene shares one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    pub id: String,
    pub acquired: NaiveDate,
    pub cloud_cover_pct: f64,
    pub bbox: BoundingBox,
    pub width: usize,
    pub height: usize,
    pub pixel_size_m: f64,
    pub bands: Vec<BandId>,
    /// Value written for no-data pixels.
    pub nodata: f32,
}

impl SceneManifest {
    pub fn extent(&self) -> GridExtent {
        GridExtent::new(self.bbox, self.width, self.height, self.pixel_size_m)
    }
}

/// `SceneArchive` backed by any `object_store` backend.
pub struct ObjectStoreSceneArchive {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreSceneArchive {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Open the backend described by `config`.
    pub fn from_config(config: &SceneStoreConfig) -> Result<Self> {
        Ok(Self::new(config.build()?))
    }

    fn scene_prefix(year: i32, id: &str) -> String {
        format!("{}/{}/{}", ROOT_PREFIX, year, id)
    }

    /// Store a scene, overwriting any scene with the same id and year.
    #[instrument(skip(self, scene), fields(scene_id = %scene.id))]
    pub async fn write_scene(&self, scene: &Scene) -> Result<SceneManifest> {
        let first = scene.bands.first().ok_or_else(|| {
            AuditError::Storage(format!("scene {} has no bands", scene.id))
        })?;
        let extent = first.extent;
        for band in &scene.bands {
            extent.ensure_same(&band.extent)?;
        }

        let manifest = SceneManifest {
            id: scene.id.clone(),
            acquired: scene.acquired,
            cloud_cover_pct: scene.cloud_cover_pct,
            bbox: extent.bbox,
            width: extent.width,
            height: extent.height,
            pixel_size_m: extent.pixel_size_m,
            bands: scene.bands.iter().map(|b| b.band).collect(),
            nodata: DEFAULT_NODATA,
        };

        let prefix = Self::scene_prefix(scene.acquired.year(), &scene.id);
        for band in &scene.bands {
            let path = format!("{}/{}.f32", prefix, band.band);
            self.put(&path, encode_band(&band.data, manifest.nodata)).await?;
        }

        // Manifest last so readers never see a scene with missing bands
        let json = serde_json::to_vec_pretty(&manifest)?;
        self.put(&format!("{}/{}", prefix, MANIFEST_FILE), Bytes::from(json))
            .await?;

        debug!(bands = manifest.bands.len(), "Stored scene");
        Ok(manifest)
    }

    /// Manifests of every scene stored for `year`.
    pub async fn manifests(&self, year: i32) -> Result<Vec<SceneManifest>> {
        let prefix = Path::from(format!("{}/{}", ROOT_PREFIX, year));
        let locations: Vec<Path> = self
            .store
            .list(Some(&prefix))
            .map_ok(|meta| meta.location)
            .try_collect()
            .await
            .map_err(|e| AuditError::Storage(format!("List failed: {}", e)))?;

        let manifest_paths: Vec<String> = locations
            .iter()
            .filter(|p| p.filename() == Some(MANIFEST_FILE))
            .map(|p| p.to_string())
            .collect();

        try_join_all(manifest_paths.iter().map(|path| async move {
            let bytes = self.get(path).await?;
            Ok::<_, AuditError>(serde_json::from_slice::<SceneManifest>(&bytes)?)
        }))
        .await
    }

    /// Load the band payloads for a manifest.
    pub async fn load(&self, manifest: &SceneManifest) -> Result<Scene> {
        let extent = manifest.extent();
        let prefix = Self::scene_prefix(manifest.acquired.year(), &manifest.id);

        let bands = try_join_all(manifest.bands.iter().map(|band| {
            let path = format!("{}/{}.f32", prefix, band);
            async move {
                let bytes = self.get(&path).await?;
                let data = decode_band(&bytes, manifest.nodata, extent.len())?;
                RasterBand::new(*band, extent, data)
            }
        }))
        .await?;

        Ok(Scene {
            id: manifest.id.clone(),
            acquired: manifest.acquired,
            cloud_cover_pct: manifest.cloud_cover_pct,
            bands,
        })
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let location = Path::from(path);
        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| AuditError::Storage(format!("Failed to write {}: {}", path, e)))?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        let location = Path::from(path);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| AuditError::Storage(format!("Failed to read {}: {}", path, e)))?;

        result
            .bytes()
            .await
            .map_err(|e| AuditError::Storage(format!("Failed to read bytes of {}: {}", path, e)))
    }
}

#[async_trait]
impl SceneArchive for ObjectStoreSceneArchive {
    #[instrument(skip(self), fields(year = window.year()))]
    async fn scenes(&self, bbox: &BoundingBox, window: &YearWindow) -> Result<Vec<Scene>> {
        let manifests = self.manifests(window.year()).await?;
        let total = manifests.len();

        let matching: Vec<&SceneManifest> = manifests
            .iter()
            .filter(|m| window.contains(m.acquired) && m.bbox.intersects(bbox))
            .collect();

        debug!(total, matching = matching.len(), "Selected scenes");

        try_join_all(matching.into_iter().map(|m| self.load(m))).await
    }
}
