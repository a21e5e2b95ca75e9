//! Planar coordinate helpers
//!
//! Distances here are Euclidean in raw degrees. Classification radii are
//! calibrated against that, so no geodesic correction is applied.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Component-wise arithmetic mean
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate {
            lat: (self.lat + other.lat) / 2.0,
            lng: (self.lng + other.lng) / 2.0,
        }
    }

    /// Euclidean distance in degrees
    pub fn planar_distance(&self, other: &Coordinate) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}
