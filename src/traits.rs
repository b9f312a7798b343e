//! Shared trait abstractions
//!
//! The grid layer owns tile bookkeeping only. Everything it needs from the
//! outside world goes through the traits below: the host viewport and
//! projection ([`MapView`]), the rendering surface ([`TileRenderer`]) and the
//! asset source ([`TileFetcher`]).

use crate::{
    core::{
        bounds::Bounds,
        geo::{LatLng, Point},
    },
    layers::grid::buffer::ZoomTransform,
    tiles::{
        key::{TileCoordinate, TileKey},
        loader::{TileData, TileRequest},
    },
};

/// Unified matrix transformation operations
///
/// Matrices use the CSS 2D layout `[a, b, c, d, e, f]`, mapping
/// `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
pub trait MatrixTransform {
    /// Apply 2D transformation matrix
    fn apply_transform(&self, matrix: &[f64; 6]) -> Self;

    /// Create transformation matrix from translation and scale
    fn create_transform_matrix(translate: Point, scale: f64) -> [f64; 6] {
        [scale, 0.0, 0.0, scale, translate.x, translate.y]
    }

    /// Combine two transformation matrices (`a` applied after `b`)
    fn combine_matrices(a: &[f64; 6], b: &[f64; 6]) -> [f64; 6] {
        [
            a[0] * b[0] + a[2] * b[1],        // a
            a[1] * b[0] + a[3] * b[1],        // b
            a[0] * b[2] + a[2] * b[3],        // c
            a[1] * b[2] + a[3] * b[3],        // d
            a[0] * b[4] + a[2] * b[5] + a[4], // e
            a[1] * b[4] + a[3] * b[5] + a[5], // f
        ]
    }
}

impl MatrixTransform for Point {
    fn apply_transform(&self, matrix: &[f64; 6]) -> Self {
        Point::new(
            matrix[0] * self.x + matrix[2] * self.y + matrix[4], // a*x + c*y + e
            matrix[1] * self.x + matrix[3] * self.y + matrix[5], // b*x + d*y + f
        )
    }
}

/// The host map view: viewport, projection and animation state.
pub trait MapView {
    /// Visible area in world pixels at the current zoom.
    fn pixel_bounds(&self) -> Bounds;

    /// Current map zoom.
    fn zoom(&self) -> f64;

    /// World pixel that maps to the layer's (0, 0).
    fn pixel_origin(&self) -> Point;

    /// World pixel at `zoom` back to a geographic coordinate.
    fn unproject(&self, point: &Point, zoom: f64) -> LatLng;

    /// True while a zoom gesture or zoom animation is in progress.
    fn is_zooming(&self) -> bool {
        false
    }
}

/// The rendering surface that owns visual tile elements and their containers.
///
/// Handles are opaque to the grid layer; only the renderer knows what they
/// point at (DOM nodes, GPU textures, terminal cells...).
pub trait TileRenderer {
    type Visual;
    type Container;

    /// Create a container, nested in `parent` when given.
    fn create_container(&mut self, parent: Option<&Self::Container>) -> Self::Container;

    /// Put the layer container on the map pane.
    fn mount(&mut self, _container: &Self::Container) {}

    /// Take the layer container off the map pane.
    fn unmount(&mut self, _container: &Self::Container) {}

    fn create_visual(&mut self, coord: &TileCoordinate) -> Self::Visual;

    fn attach(&mut self, visual: &Self::Visual, parent: &Self::Container);

    fn detach(&mut self, visual: &Self::Visual);

    fn set_position(&mut self, visual: &Self::Visual, position: Point);

    /// Drop every visual still inside `container`.
    fn clear(&mut self, container: &Self::Container);

    fn set_visible(&mut self, _container: &Self::Container, _visible: bool) {}

    fn set_z_index(&mut self, _container: &Self::Container, _z_index: i32) {}

    /// `None` resets the container to the identity transform.
    fn set_transform(&mut self, _container: &Self::Container, _transform: Option<&ZoomTransform>) {}

    fn set_opacity(&mut self, _container: &Self::Container, _opacity: f32) {}

    /// Force pending layout work so the next frame starts from settled styles.
    fn flush(&mut self, _container: &Self::Container) {}

    /// The asset behind `visual` arrived.
    fn show_loaded(&mut self, _visual: &Self::Visual, _data: Option<&TileData>) {}

    /// The asset behind `visual` failed; substitute the error placeholder.
    fn show_placeholder(&mut self, _visual: &Self::Visual) {}
}

/// The asset source behind the tiles.
///
/// `request` must not resolve synchronously into the layer; results travel
/// back through [`crate::GridLayer::resolve_tile`] or the layer's
/// [`crate::ResolutionSender`].
pub trait TileFetcher<V> {
    fn request(&mut self, request: &TileRequest, visual: &V);

    /// Stop any in-flight work for `key` and free what backs `visual`.
    fn release(&mut self, key: &TileKey, visual: &V);
}
