use crate::core::constants::{MAX_LATITUDE, WORLD_SIZE};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Clamps latitude to the Web Mercator range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn divide(&self, scalar: f64) -> Point {
        Point::new(self.x / scalar, self.y / scalar)
    }

    /// Squared euclidean distance, enough for ordering by distance.
    pub fn squared_distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    pub fn round(&self) -> Point {
        Point::new(self.x.round(), self.y.round())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Builds the bounds spanned by two arbitrary corners.
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        Self::from_coords(a.lat.min(b.lat), a.lng.min(b.lng), a.lat.max(b.lat), a.lng.max(b.lng))
    }

    /// Strict overlap on the latitude axis (touching edges do not count).
    pub fn overlaps_lat(&self, other: &LatLngBounds) -> bool {
        other.south_west.lat < self.north_east.lat && other.north_east.lat > self.south_west.lat
    }

    /// Strict overlap on the longitude axis (touching edges do not count).
    pub fn overlaps_lng(&self, other: &LatLngBounds) -> bool {
        other.south_west.lng < self.north_east.lng && other.north_east.lng > self.south_west.lng
    }
}

/// Pixel size of the world at `zoom` for the spherical mercator projection.
pub fn world_scale(zoom: f64) -> f64 {
    WORLD_SIZE * 2_f64.powf(zoom)
}

/// Projects a LatLng to world pixel coordinates at the given zoom (EPSG:3857).
pub fn project(lat_lng: &LatLng, zoom: f64) -> Point {
    let scale = world_scale(zoom);
    let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();

    let x = (lat_lng.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * scale;

    Point::new(x, y)
}

/// Unprojects world pixel coordinates back to LatLng at the given zoom.
pub fn unproject(point: &Point, zoom: f64) -> LatLng {
    let scale = world_scale(zoom);

    let lng = point.x / scale * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * point.y / scale)).sinh().atan().to_degrees();

    LatLng::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(40.7128, -74.0060);
        assert_eq!(coord.lat, 40.7128);
        assert_eq!(coord.lng, -74.0060);
        assert_eq!(LatLng::clamp_lat(89.0), MAX_LATITUDE);
    }

    #[test]
    fn test_projection_round_trip() {
        let berlin = LatLng::new(52.52, 13.405);
        let pixel = project(&berlin, 10.0);
        let back = unproject(&pixel, 10.0);

        assert!((back.lat - berlin.lat).abs() < 1e-9);
        assert!((back.lng - berlin.lng).abs() < 1e-9);
    }

    #[test]
    fn test_projection_origin() {
        let nw = unproject(&Point::new(0.0, 0.0), 0.0);
        assert!((nw.lng + 180.0).abs() < 1e-9);
        assert!((nw.lat - MAX_LATITUDE).abs() < 1e-6);

        let center = project(&LatLng::new(0.0, 0.0), 1.0);
        assert!((center.x - 256.0).abs() < 1e-9);
        assert!((center.y - 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_axis_overlap_is_strict() {
        let a = LatLngBounds::from_coords(0.0, 0.0, 10.0, 10.0);
        let touching = LatLngBounds::from_coords(10.0, 10.0, 20.0, 20.0);
        let inside = LatLngBounds::from_coords(5.0, 5.0, 6.0, 6.0);

        assert!(!a.overlaps_lat(&touching));
        assert!(!a.overlaps_lng(&touching));
        assert!(a.overlaps_lat(&inside));
        assert!(a.overlaps_lng(&inside));
    }

    #[test]
    fn test_bounds_from_corners() {
        let bounds = LatLngBounds::from_corners(LatLng::new(10.0, -5.0), LatLng::new(-3.0, 7.0));
        assert_eq!(bounds.south_west, LatLng::new(-3.0, -5.0));
        assert_eq!(bounds.north_east, LatLng::new(10.0, 7.0));
    }
}
