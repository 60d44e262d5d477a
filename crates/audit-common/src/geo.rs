//! Geographic coordinates and distance helpers.

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.32;

/// A validated (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Validate and build a coordinate.
    ///
    /// Latitude must lie in [-90, 90] and longitude in [-180, 180]; NaN is
    /// rejected.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AuditError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance to a (lon, lat) point in kilometers.
    pub fn haversine_km(&self, lon: f64, lat: f64) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = lat.to_radians();
        let delta_lat = (lat - self.lat).to_radians();
        let delta_lon = (lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Degrees of (longitude, latitude) spanned by `km` at this latitude.
    pub fn degrees_for_km(&self, km: f64) -> (f64, f64) {
        // Clamp near the poles so longitude spans stay finite
        let cos_lat = self.lat.to_radians().cos().max(0.01);
        (km / (KM_PER_DEGREE * cos_lat), km / KM_PER_DEGREE)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(matches!(
            Coordinate::new(90.5, 0.0),
            Err(AuditError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, -180.1).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_haversine_london_paris() {
        let london = Coordinate::new(51.5074, -0.1276).unwrap();
        let km = london.haversine_km(2.3522, 48.8566);
        assert!((km - 344.0).abs() < 5.0, "Distance was {} km", km);
    }

    #[test]
    fn test_haversine_same_point() {
        let c = Coordinate::new(35.2, -97.5).unwrap();
        assert!(c.haversine_km(-97.5, 35.2).abs() < 1e-9);
    }

    #[test]
    fn test_degrees_for_km_widens_with_latitude() {
        let equator = Coordinate::new(0.0, 0.0).unwrap();
        let north = Coordinate::new(60.0, 0.0).unwrap();
        let (lon_eq, lat_eq) = equator.degrees_for_km(10.0);
        let (lon_n, lat_n) = north.degrees_for_km(10.0);
        assert!((lon_eq - lat_eq).abs() < 1e-12);
        assert!((lat_eq - lat_n).abs() < 1e-12);
        assert!((lon_n - 2.0 * lon_eq).abs() < 1e-6);
    }
}
