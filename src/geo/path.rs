//! Ordered trail paths and their stored text encoding.

use super::{distance, GeoPoint};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors decoding a stored point or path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("invalid encoding: {0}")]
    Encoding(String),

    #[error("path is empty")]
    Empty,

    #[error("point {index} is invalid: {reason}")]
    InvalidPoint { index: usize, reason: String },
}

/// A non-empty, ordered sequence of points in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")]
pub struct TrailPath {
    points: Vec<GeoPoint>,
}

impl TrailPath {
    /// Build a path from points, validating every coordinate.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self, PathError> {
        if points.is_empty() {
            return Err(PathError::Empty);
        }
        for (index, point) in points.iter().enumerate() {
            point
                .validate()
                .map_err(|reason| PathError::InvalidPoint { index, reason })?;
        }
        Ok(Self { points })
    }

    /// Decode a path from its stored text form, e.g. `[[45.0,7.0],[45.1,7.1]]`.
    ///
    /// Malformed input is rejected as a whole; nothing is skipped or repaired.
    pub fn decode(text: &str) -> Result<Self, PathError> {
        let points: Vec<GeoPoint> =
            serde_json::from_str(text).map_err(|e| PathError::Encoding(e.to_string()))?;
        Self::new(points)
    }

    /// Encode the path to its stored text form.
    pub fn encode(&self) -> String {
        let pairs: Vec<String> = self.points.iter().map(GeoPoint::encode).collect();
        format!("[{}]", pairs.join(","))
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> GeoPoint {
        self.points[0]
    }

    pub fn last(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    /// Length of each consecutive segment in meters.
    pub fn segment_lengths(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|pair| distance(pair[0], pair[1]))
            .collect()
    }

    /// Total path length in meters.
    pub fn total_length(&self) -> f64 {
        self.segment_lengths().iter().sum()
    }
}

impl TryFrom<Vec<GeoPoint>> for TrailPath {
    type Error = PathError;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<TrailPath> for Vec<GeoPoint> {
    fn from(path: TrailPath) -> Self {
        path.points
    }
}
