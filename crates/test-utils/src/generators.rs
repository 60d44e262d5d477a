//! Test data generators for synthetic reflectance data.
//!
//! These generators create predictable, verifiable rasters and scenes that
//! can be used across the test suite.

use audit_common::{AuditYear, BoundingBox};
use chrono::NaiveDate;
use vegetation::{
    BandId, Composite, GridExtent, IndexRaster, RasterBand, Region, Scene,
};

/// Creates a reflectance grid with predictable values.
///
/// Each cell value is calculated as: `(col * 10 + row) / 1000`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == (col * 10 + row) / 1000.
///
/// # Returns
///
/// A `Vec<Option<f32>>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_reflectance_grid;
///
/// let grid = create_reflectance_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[0], Some(0.0));
/// assert_eq!(grid[1], Some(0.01));  // col=1, row=0
/// assert_eq!(grid[10], Some(0.001)); // col=0, row=1
/// ```
pub fn create_reflectance_grid(width: usize, height: usize) -> Vec<Option<f32>> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(Some((col * 10 + row) as f32 / 1000.0));
        }
    }
    data
}

/// Creates a grid where every `nodata_every`-th cell is missing.
pub fn create_grid_with_nodata(
    width: usize,
    height: usize,
    value: f32,
    nodata_every: usize,
) -> Vec<Option<f32>> {
    (0..width * height)
        .map(|i| {
            if nodata_every > 0 && i % nodata_every == 0 {
                None
            } else {
                Some(value)
            }
        })
        .collect()
}

/// A small extent over `bbox` for hand-built rasters.
pub fn test_extent(bbox: BoundingBox, width: usize, height: usize) -> GridExtent {
    GridExtent::new(bbox, width, height, 30.0)
}

/// A composite with uniform NIR and red values across `extent`.
///
/// `None` fills the band with no-data.
pub fn uniform_composite(
    year: AuditYear,
    extent: GridExtent,
    nir: Option<f32>,
    red: Option<f32>,
) -> Composite {
    Composite {
        year,
        cloud_threshold_pct: 60.0,
        scene_count: 1,
        extent,
        bands: [
            (BandId::Nir, RasterBand::filled(BandId::Nir, extent, nir)),
            (BandId::Red, RasterBand::filled(BandId::Red, extent, red)),
        ]
        .into_iter()
        .collect(),
    }
}

/// An index raster with the given row-major values on a single row.
pub fn index_row(year: AuditYear, bbox: BoundingBox, values: Vec<Option<f32>>) -> IndexRaster {
    let extent = test_extent(bbox, values.len(), 1);
    IndexRaster {
        year,
        extent,
        values,
    }
}

/// Mid-year acquisition date for `year`.
pub fn mid_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 7, 1).unwrap_or(NaiveDate::MIN)
}

/// A scene with uniform NIR and red reflectance whose footprint covers
/// `region` with a margin.
pub fn scene_over(
    region: &Region,
    id: &str,
    acquired: NaiveDate,
    cloud_cover_pct: f64,
    nir: f32,
    red: f32,
) -> Scene {
    let bbox = region.bbox();
    let margin_lon = bbox.width() * 0.25;
    let margin_lat = bbox.height() * 0.25;
    let footprint = BoundingBox::new(
        bbox.min_lon - margin_lon,
        bbox.min_lat - margin_lat,
        bbox.max_lon + margin_lon,
        bbox.max_lat + margin_lat,
    );
    let extent = GridExtent::new(footprint, 16, 16, 30.0);

    Scene {
        id: id.to_string(),
        acquired,
        cloud_cover_pct,
        bands: vec![
            RasterBand::filled(BandId::Nir, extent, Some(nir)),
            RasterBand::filled(BandId::Red, extent, Some(red)),
        ],
    }
}
