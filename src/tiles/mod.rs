//! Tile bookkeeping: coordinate keys, the tracked set, load planning and the
//! asset-loading plumbing.

pub mod key;
pub mod loader;
pub mod planner;
pub mod set;

pub use key::{TileCoordinate, TileKey};
pub use loader::{ResolutionSender, TileOutcome, TileRequest, TileResolution};
pub use planner::{TilePlanner, TileValidator};
pub use set::{TileRecord, TileSet, TileStatus};
