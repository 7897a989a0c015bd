//! Geographic coordinates.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// The coordinate as a `geo` point (x = longitude, y = latitude).
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// The coordinate as an `[x, y]` pair for spatial indexing.
    pub fn to_xy(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Build a coordinate back from an `[x, y]` pair.
    pub fn from_xy(xy: [f64; 2]) -> Self {
        Self {
            lat: xy[1],
            lon: xy[0],
        }
    }

    /// Great-circle distance in metres.
    ///
    /// ```
    /// use transit_router::domain::Coord;
    ///
    /// let a = Coord::new(52.0, 13.0);
    /// let b = Coord::new(52.0, 13.001);
    /// let d = a.distance_m(b);
    /// assert!((d - 68.5).abs() < 1.0);
    /// ```
    pub fn distance_m(self, other: Coord) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }
}
