//! Integration tests: scene archive on a temporary local filesystem store.

use audit_common::{AuditError, AuditYear, BoundingBox, Persona};
use scene_store::{ObjectStoreSceneArchive, SceneStoreConfig};
use test_utils::{mid_year, places, radii, region_for, scene_over, temp_dir};
use vegetation::{BandId, CompositeProvider, GridExtent, MedianCompositor, RasterBand, Scene, SceneArchive};

fn open(dir: &tempfile::TempDir) -> ObjectStoreSceneArchive {
    let config = SceneStoreConfig::Local {
        root: dir.path().to_path_buf(),
    };
    ObjectStoreSceneArchive::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_written_scene_is_read_back_with_nodata() {
    let dir = temp_dir();
    let archive = open(&dir);

    let extent = GridExtent::new(BoundingBox::new(10.0, 10.0, 11.0, 11.0), 2, 2, 30.0);
    let scene = Scene {
        id: "LC08_044034_20140612".to_string(),
        acquired: mid_year(2014),
        cloud_cover_pct: 14.5,
        bands: vec![
            RasterBand::new(BandId::Nir, extent, vec![Some(0.5), None, Some(0.4), Some(0.3)])
                .unwrap(),
            RasterBand::filled(BandId::Red, extent, Some(0.1)),
        ],
    };

    let manifest = archive.write_scene(&scene).await.unwrap();
    assert_eq!(manifest.bands, vec![BandId::Nir, BandId::Red]);

    let found = archive
        .scenes(&BoundingBox::new(10.5, 10.5, 12.0, 12.0), &AuditYear(2014).window())
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0], scene);
}

#[tokio::test]
async fn test_scenes_filtered_by_year_and_bbox() {
    let dir = temp_dir();
    let archive = open(&dir);
    let region = region_for(places::NEW_DELHI, radii::NEIGHBORHOOD, Persona::Student);

    archive
        .write_scene(&scene_over(&region, "a_2014", mid_year(2014), 10.0, 0.5, 0.1))
        .await
        .unwrap();
    archive
        .write_scene(&scene_over(&region, "b_2024", mid_year(2024), 10.0, 0.6, 0.05))
        .await
        .unwrap();

    let elsewhere = region_for(places::SAHARA, radii::NEIGHBORHOOD, Persona::Student);
    archive
        .write_scene(&scene_over(&elsewhere, "c_2014", mid_year(2014), 10.0, 0.2, 0.2))
        .await
        .unwrap();

    let found = archive
        .scenes(&region.bbox(), &AuditYear(2014).window())
        .await
        .unwrap();
    let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a_2014"]);
}

#[tokio::test]
async fn test_empty_year_has_no_scenes() {
    let dir = temp_dir();
    let archive = open(&dir);
    let found = archive
        .scenes(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), &AuditYear(2019).window())
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_corrupt_band_is_storage_error() {
    let dir = temp_dir();
    let archive = open(&dir);
    let region = region_for(places::ORIGIN, radii::MIN, Persona::Public);
    archive
        .write_scene(&scene_over(&region, "broken", mid_year(2020), 5.0, 0.5, 0.1))
        .await
        .unwrap();

    std::fs::write(dir.path().join("scenes/2020/broken/nir.f32"), [0u8; 3]).unwrap();

    let err = archive
        .scenes(&region.bbox(), &AuditYear(2020).window())
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Storage(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_compositor_over_stored_scenes() {
    let dir = temp_dir();
    let archive = open(&dir);
    let region = region_for(places::ORIGIN, radii::MIN, Persona::Scientist);

    for (id, cloud) in [("s1", 5.0), ("s2", 45.0), ("s3", 90.0)] {
        archive
            .write_scene(&scene_over(&region, id, mid_year(2024), cloud, 0.6, 0.05))
            .await
            .unwrap();
    }

    let compositor = MedianCompositor::new(archive, 100.0, 256);
    let composite = compositor
        .get_composite(&region, AuditYear(2024), 60.0)
        .await
        .unwrap();

    assert_eq!(composite.scene_count, 2);
    let nir = composite.band(BandId::Nir).unwrap();
    let center = nir.extent.width / 2;
    assert_eq!(nir.get(center, center), Some(0.6));
}
