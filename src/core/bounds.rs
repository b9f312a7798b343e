use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Represents a bounding box in screen/pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Creates bounds from a center point and size
    pub fn from_center_and_size(center: Point, width: f64, height: f64) -> Self {
        let half_width = width / 2.0;
        let half_height = height / 2.0;
        Self::new(
            Point::new(center.x - half_width, center.y - half_height),
            Point::new(center.x + half_width, center.y + half_height),
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(0.0, 0.0))
    }
}

/// Inclusive rectangle of tile indices, derived from pixel bounds each update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileBounds {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Divides pixel bounds by the tile size and floors both corners.
    pub fn from_pixel_bounds(bounds: &Bounds, tile_size: u32) -> Self {
        let size = tile_size as f64;
        let min = bounds.min.divide(size).floor();
        let max = bounds.max.divide(size).floor();
        Self::new(min.x as i32, min.y as i32, max.x as i32, max.y as i32)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Center of the rectangle in tile-index space.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x as f64 + self.max_x as f64) / 2.0,
            (self.min_y as f64 + self.max_y as f64) / 2.0,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Number of tile indices covered.
    pub fn len(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        let columns = (self.max_x as i64 - self.min_x as i64 + 1) as usize;
        let rows = (self.max_y as i64 - self.min_y as i64 + 1) as usize;
        columns * rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every `(column, row)` pair in row-major order: rows outer, columns inner.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.min_y..=self.max_y).flat_map(move |y| (self.min_x..=self.max_x).map(move |x| (x, y)))
    }
}
