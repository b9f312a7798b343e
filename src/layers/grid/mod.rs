//! Grid layer: tile lifecycle, zoom transition buffer and notifications.
//!
//! Mirrors Leaflet's `GridLayer`: tiles are planned center-out for the
//! current view, tracked in a [`crate::TileSet`] and evicted as the view
//! moves on.

pub mod buffer;
pub mod events;
mod layer;
mod lifecycle;

pub use buffer::{BufferPreparation, BufferState, ZoomAnimEvent, ZoomTransform, ZoomTransitionBuffer};
pub use events::{GridEvent, GridEventCallback, GridEventKind, GridEvents};
pub use layer::GridLayer;
