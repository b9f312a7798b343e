//! Core constants derived from Leaflet defaults and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Pixel size of the whole world at zoom 0 for the map projection.
pub const WORLD_SIZE: f64 = 256.0;

/// Default minimum and maximum zoom of a grid layer.
pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// Deepest zoom whose tile columns and rows all fit an `i32`.
pub const MAX_TILE_ZOOM: u8 = 31;

/// Minimum time between two tile-plan recomputations while the map moves.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 150;

/// Delay between the last tile resolving and the back buffer being emptied.
pub const BUFFER_CLEAR_DELAY_MS: u64 = 500;

/// Loaded share above which a container counts as "mostly loaded" when a
/// zoom animation decides whether to keep the existing back buffer.
pub const LOADED_SHARE_THRESHOLD: f64 = 0.5;

/// Z-index of the front and back tile containers once a zoom settles.
pub const FRONT_CONTAINER_Z_INDEX: i32 = 2;
pub const BACK_CONTAINER_Z_INDEX: i32 = 1;

/// Web Mercator latitude limit.
pub const MAX_LATITUDE: f64 = 85.0511287798;
