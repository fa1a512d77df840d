//! Geographic primitives: points, great-circle distance, and trail paths.
//!
//! Coordinates are WGS84 latitude/longitude in degrees. Points are stored as
//! two-element JSON arrays `[latitude, longitude]`.

pub mod path;

pub use path::{PathError, TrailPath};

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    /// Latitude in degrees (-90..=90)
    pub latitude: f64,
    /// Longitude in degrees (-180..=180)
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point from latitude and longitude in degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and inside their ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(format!(
                "non-finite coordinate ({}, {})",
                self.latitude, self.longitude
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        Ok(())
    }

    /// Decode a single point from its stored text form, e.g. `[45.06,7.66]`.
    pub fn decode(text: &str) -> Result<Self, PathError> {
        let point: GeoPoint =
            serde_json::from_str(text).map_err(|e| PathError::Encoding(e.to_string()))?;
        point
            .validate()
            .map_err(|reason| PathError::InvalidPoint { index: 0, reason })?;
        Ok(point)
    }

    /// Encode this point to its stored text form.
    pub fn encode(&self) -> String {
        format!("[{},{}]", self.latitude, self.longitude)
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.latitude, point.longitude]
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Calculate the great-circle distance between two points (Haversine formula).
///
/// Returns meters. Symmetric, non-negative, and exactly zero for identical
/// points.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Convert a speed in km/h to m/s.
pub fn kmh_to_mps(speed_kmh: f64) -> f64 {
    speed_kmh / 3.6
}
