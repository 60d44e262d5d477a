//! Core raster types for the vegetation pipeline.
//!
//! No-data is represented as `None` in every pixel buffer. Sentinel values
//! from storage formats are converted at decode time and never reach the
//! arithmetic in this crate.

use std::collections::BTreeMap;

use audit_common::{AuditError, AuditYear, BoundingBox, Result};
use serde::{Deserialize, Serialize};

/// Spectral band identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandId {
    Blue,
    Green,
    Red,
    Nir,
}

impl BandId {
    pub const ALL: [BandId; 4] = [BandId::Blue, BandId::Green, BandId::Red, BandId::Nir];

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "red" => Some(Self::Red),
            "nir" => Some(Self::Nir),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
            Self::Nir => "nir",
        }
    }
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spatial layout of a raster: bounds, dimensions and nominal pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridExtent {
    /// Outer edges of the grid.
    pub bbox: BoundingBox,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Nominal ground size of one pixel in meters.
    pub pixel_size_m: f64,
}

impl GridExtent {
    pub fn new(bbox: BoundingBox, width: usize, height: usize, pixel_size_m: f64) -> Self {
        Self {
            bbox,
            width,
            height,
            pixel_size_m,
        }
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Degrees per pixel as (lon, lat).
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.bbox.width() / self.width.max(1) as f64,
            self.bbox.height() / self.height.max(1) as f64,
        )
    }

    /// Geographic center of a cell as (lon, lat). Row 0 is the northern edge.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let (res_x, res_y) = self.resolution();
        let lon = self.bbox.min_lon + (col as f64 + 0.5) * res_x;
        let lat = self.bbox.max_lat - (row as f64 + 0.5) * res_y;
        (lon, lat)
    }

    /// Cell containing a geographic point, if inside the grid.
    pub fn coords_to_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if self.is_empty() || !self.bbox.contains(lon, lat) {
            return None;
        }

        let (res_x, res_y) = self.resolution();
        let col = ((lon - self.bbox.min_lon) / res_x).floor() as usize;
        let row = ((self.bbox.max_lat - lat) / res_y).floor() as usize;

        // Points on the max edge fall into the last cell
        Some((col.min(self.width - 1), row.min(self.height - 1)))
    }

    /// Fail with `MismatchedExtent` unless both extents are identical.
    pub fn ensure_same(&self, other: &GridExtent) -> Result<()> {
        if self != other {
            return Err(AuditError::MismatchedExtent {
                left: self.to_string(),
                right: other.to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for GridExtent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} @ {:.1}m {}",
            self.width, self.height, self.pixel_size_m, self.bbox
        )
    }
}

/// One spectral band over a grid, row-major, top-to-bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterBand {
    pub band: BandId,
    pub extent: GridExtent,
    pub data: Vec<Option<f32>>,
}

impl RasterBand {
    /// Build a band, checking the buffer matches the extent.
    pub fn new(band: BandId, extent: GridExtent, data: Vec<Option<f32>>) -> Result<Self> {
        if data.len() != extent.len() {
            return Err(AuditError::MismatchedExtent {
                left: extent.to_string(),
                right: format!("{} pixels of {} band data", data.len(), band),
            });
        }
        Ok(Self { band, extent, data })
    }

    /// A band with the same value everywhere.
    pub fn filled(band: BandId, extent: GridExtent, value: Option<f32>) -> Self {
        Self {
            band,
            extent,
            data: vec![value; extent.len()],
        }
    }

    /// Value at a grid cell.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.extent.width || row >= self.extent.height {
            return None;
        }
        self.data
            .get(row * self.extent.width + col)
            .copied()
            .flatten()
    }

    /// Nearest-neighbour value at a geographic point.
    pub fn sample(&self, lon: f64, lat: f64) -> Option<f32> {
        let (col, row) = self.extent.coords_to_cell(lon, lat)?;
        self.get(col, row)
    }

    /// Number of pixels holding a measurement.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }
}

/// Cloud-filtered, median-reduced reflectance for one year over one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub year: AuditYear,
    /// Cloud-cover threshold used to select scenes.
    pub cloud_threshold_pct: f64,
    /// Number of scenes that passed the cloud filter.
    pub scene_count: usize,
    pub extent: GridExtent,
    pub bands: BTreeMap<BandId, RasterBand>,
}

impl Composite {
    pub fn new(
        year: AuditYear,
        cloud_threshold_pct: f64,
        scene_count: usize,
        extent: GridExtent,
    ) -> Self {
        Self {
            year,
            cloud_threshold_pct,
            scene_count,
            extent,
            bands: BTreeMap::new(),
        }
    }

    /// Add a band; its extent must match the composite.
    pub fn with_band(mut self, band: RasterBand) -> Result<Self> {
        self.extent.ensure_same(&band.extent)?;
        self.bands.insert(band.band, band);
        Ok(self)
    }

    pub fn band(&self, id: BandId) -> Option<&RasterBand> {
        self.bands.get(&id)
    }
}

/// Per-pixel normalized difference vegetation index in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRaster {
    pub year: AuditYear,
    pub extent: GridExtent,
    pub values: Vec<Option<f32>>,
}

impl IndexRaster {
    pub fn new(year: AuditYear, extent: GridExtent, values: Vec<Option<f32>>) -> Result<Self> {
        if values.len() != extent.len() {
            return Err(AuditError::MismatchedExtent {
                left: extent.to_string(),
                right: format!("{} index values", values.len()),
            });
        }
        Ok(Self {
            year,
            extent,
            values,
        })
    }

    /// Iterator over valid pixel values.
    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent_3x3() -> GridExtent {
        GridExtent::new(BoundingBox::new(0.0, 0.0, 3.0, 3.0), 3, 3, 30.0)
    }

    #[test]
    fn test_cell_center_and_lookup() {
        let extent = extent_3x3();
        assert_eq!(extent.cell_center(0, 0), (0.5, 2.5));
        assert_eq!(extent.coords_to_cell(0.5, 2.5), Some((0, 0)));
        assert_eq!(extent.coords_to_cell(3.0, 0.0), Some((2, 2)));
        assert_eq!(extent.coords_to_cell(3.1, 0.0), None);
    }

    #[test]
    fn test_band_sample_nearest() {
        let data: Vec<Option<f32>> = (0..9).map(|i| Some(i as f32)).collect();
        let band = RasterBand::new(BandId::Nir, extent_3x3(), data).unwrap();
        assert_eq!(band.get(2, 2), Some(8.0));
        assert_eq!(band.sample(1.4, 1.6), Some(4.0));
        assert_eq!(band.get(3, 0), None);
    }

    #[test]
    fn test_band_length_checked() {
        let err = RasterBand::new(BandId::Red, extent_3x3(), vec![Some(1.0); 4]).unwrap_err();
        assert!(matches!(err, AuditError::MismatchedExtent { .. }));
    }

    #[test]
    fn test_composite_rejects_foreign_extent() {
        let other = GridExtent::new(BoundingBox::new(0.0, 0.0, 6.0, 6.0), 3, 3, 60.0);
        let composite = Composite::new(AuditYear(2014), 60.0, 1, extent_3x3());
        let band = RasterBand::filled(BandId::Red, other, Some(0.1));
        assert!(composite.with_band(band).is_err());
    }

    #[test]
    fn test_band_id_parse() {
        assert_eq!(BandId::parse("NIR"), Some(BandId::Nir));
        assert_eq!(BandId::parse("swir"), None);
    }
}
