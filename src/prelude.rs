//! Prelude module for common tilegrid types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tilegrid::prelude::*;`

pub use crate::core::{
    bounds::{Bounds, TileBounds},
    config::{BoundsPolicy, GridLayerOptions},
    geo::{LatLng, LatLngBounds, Point},
    scheduler::UpdateScheduler,
    viewport::Viewport,
};

pub use crate::layers::grid::{
    buffer::{BufferPreparation, BufferState, ZoomAnimEvent, ZoomTransform, ZoomTransitionBuffer},
    events::{GridEvent, GridEventKind, GridEvents},
    GridLayer,
};

pub use crate::tiles::{
    key::{TileCoordinate, TileKey},
    loader::{RequestTicket, ResolutionSender, TileData, TileOutcome, TileRequest, TileResolution},
    planner::{TilePlanner, TileValidator},
    set::{TileRecord, TileSet, TileStatus},
};

#[cfg(feature = "tokio-runtime")]
pub use crate::tiles::loader::{AsyncTileFetcher, TileLoader};

pub use crate::traits::{MapView, TileFetcher, TileRenderer};

pub use crate::{Error as GridError, Result};

pub use std::{sync::Arc, time::Duration};

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
