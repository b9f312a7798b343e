//! Works out which tiles a viewport needs and in what order to load them.

use crate::{
    core::{
        bounds::{Bounds, TileBounds},
        config::{BoundsPolicy, GridLayerOptions},
        geo::{LatLngBounds, Point},
    },
    tiles::key::TileCoordinate,
    traits::MapView,
};

/// Turns pixel bounds into an ordered list of tiles to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlanner {
    tile_size: u32,
}

impl TilePlanner {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Tile-index rectangle covering `pixel_bounds`, both corners floored.
    pub fn tile_bounds(&self, pixel_bounds: &Bounds) -> TileBounds {
        TileBounds::from_pixel_bounds(pixel_bounds, self.tile_size)
    }

    /// Tiles of `pixel_bounds` that pass `accept`, nearest to the center first.
    ///
    /// `accept` is where callers reject tiles they already track and tiles
    /// outside the layer's bounds. An empty result means nothing to add.
    pub fn plan<F>(&self, pixel_bounds: &Bounds, zoom: u8, accept: F) -> Vec<TileCoordinate>
    where
        F: FnMut(&TileCoordinate) -> bool,
    {
        self.plan_range(&self.tile_bounds(pixel_bounds), zoom, accept)
    }

    /// Same as [`TilePlanner::plan`] for an already computed tile rectangle.
    pub fn plan_range<F>(&self, bounds: &TileBounds, zoom: u8, mut accept: F) -> Vec<TileCoordinate>
    where
        F: FnMut(&TileCoordinate) -> bool,
    {
        let center = bounds.center();

        let mut queue: Vec<TileCoordinate> = bounds
            .iter()
            .map(|(x, y)| TileCoordinate::new(x, y, zoom))
            .filter(|coord| accept(coord))
            .collect();

        // Stable sort: equidistant tiles keep row-major order.
        queue.sort_by(|a, b| {
            let da = a.as_point().squared_distance_to(&center);
            let db = b.as_point().squared_distance_to(&center);
            da.total_cmp(&db)
        });

        queue
    }
}

impl Default for TilePlanner {
    fn default() -> Self {
        Self::new(crate::constants::TILE_SIZE)
    }
}

/// Decides whether a tile lies inside the layer's geographic bounds.
///
/// An axis passes when it wraps or when the tile overlaps the bounds on that
/// axis; [`BoundsPolicy`] decides how the two axes combine.
#[derive(Debug, Clone, PartialEq)]
pub struct TileValidator {
    pub wrap_x: bool,
    pub wrap_y: bool,
    pub bounds: Option<LatLngBounds>,
    pub policy: BoundsPolicy,
    pub tile_size: u32,
}

impl TileValidator {
    pub fn from_options(options: &GridLayerOptions) -> Self {
        Self {
            wrap_x: options.wrap_x,
            wrap_y: options.wrap_y,
            bounds: options.bounds.clone(),
            policy: options.bounds_policy,
            tile_size: options.tile_size,
        }
    }

    pub fn is_valid<V>(&self, coord: &TileCoordinate, view: &V) -> bool
    where
        V: MapView + ?Sized,
    {
        let Some(max_bounds) = &self.bounds else {
            return true;
        };

        let tile = self.tile_lat_lng_bounds(coord, view);
        let lng_ok = self.wrap_x || max_bounds.overlaps_lng(&tile);
        let lat_ok = self.wrap_y || max_bounds.overlaps_lat(&tile);

        match self.policy {
            BoundsPolicy::AnyAxis => lng_ok || lat_ok,
            BoundsPolicy::AllAxes => lng_ok && lat_ok,
        }
    }

    /// Geographic extent of a tile, through the host's projection.
    pub fn tile_lat_lng_bounds<V>(&self, coord: &TileCoordinate, view: &V) -> LatLngBounds
    where
        V: MapView + ?Sized,
    {
        let size = self.tile_size as f64;
        let nw_point = coord.as_point().multiply(size);
        let se_point = nw_point.add(&Point::new(size, size));
        let zoom = coord.z as f64;

        LatLngBounds::from_corners(view.unproject(&nw_point, zoom), view.unproject(&se_point, zoom))
    }
}
