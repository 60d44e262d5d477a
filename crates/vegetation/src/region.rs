//! Region of interest: a disc around a coordinate.

use audit_common::{AuditError, BoundingBox, Coordinate, Result};
use serde::{Deserialize, Serialize};

use crate::config::RadiusRange;
use crate::types::GridExtent;

/// Number of vertices used to approximate the disc boundary.
const DISC_VERTICES: usize = 64;

/// A closed disc-shaped area of interest in geographic coordinates.
///
/// Immutable once built; both composites of an audit are requested with
/// the same `Region`, which keeps their grids identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    center: Coordinate,
    radius_km: f64,
    /// Closed ring of (lon, lat) vertices; the first vertex is repeated last.
    boundary: Vec<(f64, f64)>,
    bbox: BoundingBox,
}

impl Region {
    /// Build a disc of `radius_km` around `center`.
    ///
    /// The radius is clamped into `range` before use. Non-finite or
    /// non-positive radii fail with `InvalidRadius`.
    pub fn build(center: Coordinate, radius_km: f64, range: &RadiusRange) -> Result<Self> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(AuditError::InvalidRadius(format!(
                "radius must be a positive number of kilometers, got {}",
                radius_km
            )));
        }

        let radius_km = range.clamp(radius_km);
        let (dlon, dlat) = center.degrees_for_km(radius_km);

        let mut boundary: Vec<(f64, f64)> = (0..DISC_VERTICES)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / DISC_VERTICES as f64;
                (
                    center.lon() + dlon * theta.cos(),
                    center.lat() + dlat * theta.sin(),
                )
            })
            .collect();
        boundary.push(boundary[0]);

        // Grids never extend past the poles; the boundary ring is left
        // symmetric about the center.
        let bbox = BoundingBox::new(
            center.lon() - dlon,
            (center.lat() - dlat).max(-90.0),
            center.lon() + dlon,
            (center.lat() + dlat).min(90.0),
        );

        Ok(Self {
            center,
            radius_km,
            boundary,
            bbox,
        })
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Radius after clamping.
    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn boundary(&self) -> &[(f64, f64)] {
        &self.boundary
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Vertex centroid of the boundary ring as (lon, lat).
    pub fn centroid(&self) -> (f64, f64) {
        // Skip the closing vertex so it is not counted twice
        let ring = &self.boundary[..self.boundary.len() - 1];
        let n = ring.len() as f64;
        let (sum_lon, sum_lat) = ring
            .iter()
            .fold((0.0, 0.0), |(a, b), (lon, lat)| (a + lon, b + lat));
        (sum_lon / n, sum_lat / n)
    }

    /// Whether a (lon, lat) point lies inside the disc.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.center.haversine_km(lon, lat) <= self.radius_km
    }

    /// Raster grid covering the region's bounding box.
    ///
    /// Pixels are `pixel_size_m` on a side unless that would exceed
    /// `max_dim` pixels across, in which case they are coarsened.
    pub fn grid(&self, pixel_size_m: f64, max_dim: usize) -> GridExtent {
        let diameter_m = self.radius_km * 2000.0;
        let mut pixel_size_m = pixel_size_m;
        let mut dim = (diameter_m / pixel_size_m).ceil().max(1.0) as usize;

        if dim > max_dim {
            dim = max_dim.max(1);
            pixel_size_m = diameter_m / dim as f64;
        }

        GridExtent::new(self.bbox, dim, dim, pixel_size_m)
    }
}
