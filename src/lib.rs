//! # tilegrid
//!
//! Tile-grid lifecycle engine for pannable, zoomable maps, modelled after
//! Leaflet's grid layer.
//!
//! The engine decides which tile coordinates the viewport needs, requests
//! them center-out, evicts tiles that scroll away, and keeps the pre-zoom
//! imagery on screen during zoom animations through a double-buffered pair
//! of tile containers. Projection, rendering and asset fetching stay with the
//! host and are reached through the traits in [`traits`].

pub mod core;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub mod traits;

pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::{Bounds, TileBounds},
    config::{BoundsPolicy, GridLayerOptions},
    geo::{LatLng, LatLngBounds, Point},
    scheduler::UpdateScheduler,
    viewport::Viewport,
};

pub use layers::grid::{
    buffer::{BufferPreparation, BufferState, ZoomAnimEvent, ZoomTransform, ZoomTransitionBuffer},
    events::{GridEvent, GridEventKind, GridEvents},
    GridLayer,
};

pub use tiles::{
    key::{TileCoordinate, TileKey},
    loader::{RequestTicket, ResolutionSender, TileOutcome, TileRequest, TileResolution},
    planner::{TilePlanner, TileValidator},
    set::{TileRecord, TileSet, TileStatus},
};

pub use traits::{MapView, TileFetcher, TileRenderer};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, GridError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Duplicate tile key: {0} is already tracked")]
    DuplicateKey(TileKey),

    #[error("Tile not found: {0}")]
    NotFound(TileKey),

    #[error("Invalid tile key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Load error: {0}")]
    Load(String),
}

/// Error type alias for convenience
pub type Error = GridError;

/// Install `env_logger` as the `log` backend, honouring `RUST_LOG`.
#[cfg(feature = "debug")]
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
