use crate::core::{
    bounds::Bounds,
    geo::{self, LatLng, Point},
};
use crate::traits::MapView;
use serde::{Deserialize, Serialize};

/// Minimal Web Mercator map view: center, zoom and screen size.
///
/// Hosts with their own map state implement [`MapView`] directly; this type
/// covers headless use and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Pixel origin, fixed at the last view reset
    pixel_origin: Option<Point>,
    /// Set while a zoom animation runs
    zooming: bool,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        let mut viewport = Self {
            center,
            zoom: zoom.clamp(0.0, 18.0),
            size,
            min_zoom: 0.0,
            max_zoom: 18.0,
            pixel_origin: None,
            zooming: false,
        };
        viewport.reset_pixel_origin();
        viewport
    }

    /// Moves the center without touching the pixel origin, like a pan.
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(LatLng::clamp_lat(center.lat), center.lng);
    }

    /// Changes zoom and resets the pixel origin, like a view reset.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.reset_pixel_origin();
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    pub fn set_zooming(&mut self, zooming: bool) {
        self.zooming = zooming;
    }

    /// Pans by a screen-pixel offset.
    pub fn pan(&mut self, delta: Point) {
        let center_px = self.project(&self.center);
        let new_center = self.unproject_at_zoom(&center_px.add(&delta));
        self.set_center(new_center);
    }

    /// Projects a LatLng to world pixels at the current zoom
    pub fn project(&self, lat_lng: &LatLng) -> Point {
        geo::project(lat_lng, self.zoom)
    }

    /// Unprojects world pixels at the current zoom
    pub fn unproject_at_zoom(&self, point: &Point) -> LatLng {
        geo::unproject(point, self.zoom)
    }

    /// Leaflet's new pixel origin: the rounded top-left corner of the view.
    pub fn reset_pixel_origin(&mut self) {
        let half = self.size.divide(2.0);
        self.pixel_origin = Some(self.project(&self.center).subtract(&half).round());
    }
}

impl MapView for Viewport {
    fn pixel_bounds(&self) -> Bounds {
        Bounds::from_center_and_size(self.project(&self.center), self.size.x, self.size.y)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn pixel_origin(&self) -> Point {
        let half = self.size.divide(2.0);
        self.pixel_origin
            .unwrap_or_else(|| self.project(&self.center).subtract(&half).round())
    }

    fn unproject(&self, point: &Point, zoom: f64) -> LatLng {
        geo::unproject(point, zoom)
    }

    fn is_zooming(&self) -> bool {
        self.zooming
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_bounds_centered_on_view() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 2.0, Point::new(512.0, 256.0));
        let bounds = viewport.pixel_bounds();

        // World is 1024px wide at zoom 2, so the equator/meridian is at 512.
        assert!((bounds.min.x - 256.0).abs() < 1e-6);
        assert!((bounds.max.x - 768.0).abs() < 1e-6);
        assert!((bounds.min.y - 384.0).abs() < 1e-6);
        assert!((bounds.max.y - 640.0).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_origin_is_top_left_rounded() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 2.0, Point::new(512.0, 256.0));
        assert_eq!(MapView::pixel_origin(&viewport), Point::new(256.0, 384.0));
    }

    #[test]
    fn test_pan_keeps_origin_until_reset() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 3.0, Point::new(256.0, 256.0));
        let origin = MapView::pixel_origin(&viewport);

        viewport.pan(Point::new(100.0, 0.0));
        assert_eq!(MapView::pixel_origin(&viewport), origin);
        assert!(viewport.center.lng > 0.0);

        viewport.set_zoom(4.0);
        assert_ne!(MapView::pixel_origin(&viewport), origin);
    }

    #[test]
    fn test_zoom_limits_and_animation_flag() {
        let mut viewport = Viewport::new(LatLng::default(), 12.0, Point::new(100.0, 100.0));
        viewport.set_zoom_limits(2.0, 8.0);
        assert_eq!(viewport.zoom, 8.0);

        assert!(!viewport.is_zooming());
        viewport.set_zooming(true);
        assert!(viewport.is_zooming());
    }
}
