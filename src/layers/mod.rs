//! Map layers
//!
//! Only the tile grid layer lives here; markers, vectors and other overlays
//! are left to the host.

pub mod grid;

pub use grid::GridLayer;
