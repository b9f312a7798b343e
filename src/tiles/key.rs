//! Tile coordinates and the `"{column}:{row}"` key codec.

use crate::{core::geo::Point, GridError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A tile in the grid: column, row and the zoom it was planned at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: u8,
}

impl TileCoordinate {
    pub fn new(x: i32, y: i32, z: u8) -> Self {
        Self { x, y, z }
    }

    pub fn key(&self) -> TileKey {
        TileKey::from_coordinate(self)
    }

    /// Tile-index position as a point, the representative used for distance sorting.
    pub fn as_point(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    /// Number of tiles per axis at this zoom.
    pub fn limit(&self) -> i64 {
        1_i64 << self.z.min(62)
    }

    /// Column wrapped into `[0, 2^z)` for sources that repeat horizontally.
    ///
    /// `None` when the wrapped column does not fit an `i32`, which can only
    /// happen above zoom 31.
    pub fn wrapped(&self) -> Option<TileCoordinate> {
        let x = (self.x as i64).rem_euclid(self.limit());
        let x = i32::try_from(x).ok()?;
        Some(TileCoordinate::new(x, self.y, self.z))
    }

    /// Row flipped for TMS-numbered sources.
    pub fn tms_y(&self) -> i64 {
        self.limit() - self.y as i64 - 1
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Stable map key for a tile at a fixed zoom, rendered as `"{column}:{row}"`.
///
/// Keys are built from integers and only ever parsed back from their own
/// rendering, so every `(column, row)` pair (negatives included) round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TileKey {
    x: i32,
    y: i32,
}

impl TileKey {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn from_coordinate(coord: &TileCoordinate) -> Self {
        Self::new(coord.x, coord.y)
    }

    /// The `(column, row)` pair this key was derived from.
    pub fn to_point(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn column(&self) -> i32 {
        self.x
    }

    pub fn row(&self) -> i32 {
        self.y
    }

    /// Parses a `"{column}:{row}"` string.
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = || GridError::InvalidKey(key.to_string());
        let (x, y) = key.split_once(':').ok_or_else(invalid)?;
        let x = x.parse::<i32>().map_err(|_| invalid())?;
        let y = y.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self::new(x, y))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

impl FromStr for TileKey {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<TileKey> for String {
    fn from(key: TileKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for TileKey {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<&TileCoordinate> for TileKey {
    fn from(coord: &TileCoordinate) -> Self {
        Self::from_coordinate(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(TileKey::new(3, 7).to_string(), "3:7");
        assert_eq!(TileKey::new(-1, -20).to_string(), "-1:-20");
    }

    #[test]
    fn test_key_round_trip_over_signed_range() {
        for column in -40..=40 {
            for row in [-40, -1, 0, 1, 39] {
                let coord = TileCoordinate::new(column, row, 5);
                let rendered = coord.key().to_string();
                let parsed: TileKey = rendered.parse().unwrap();
                assert_eq!(parsed.to_point(), (column, row));
            }
        }

        for (column, row) in [(i32::MIN, i32::MAX), (i32::MAX, i32::MIN), (0, i32::MIN)] {
            let parsed = TileKey::parse(&TileKey::new(column, row).to_string()).unwrap();
            assert_eq!(parsed.to_point(), (column, row));
        }
    }

    #[test]
    fn test_zoom_does_not_affect_key() {
        let a = TileCoordinate::new(4, 9, 2).key();
        let b = TileCoordinate::new(4, 9, 11).key();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        for bad in ["", "3", "3:", ":4", "a:b", "1:2:3", "1.5:2"] {
            assert!(
                matches!(TileKey::parse(bad), Err(GridError::InvalidKey(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_key_serializes_as_string() {
        let json = serde_json::to_string(&TileKey::new(-2, 5)).unwrap();
        assert_eq!(json, "\"-2:5\"");
        let back: TileKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TileKey::new(-2, 5));
    }

    #[test]
    fn test_wrapped_and_tms() {
        let coord = TileCoordinate::new(-1, 0, 2);
        assert_eq!(coord.wrapped().map(|c| c.x), Some(3));
        assert_eq!(TileCoordinate::new(9, 0, 2).wrapped().map(|c| c.x), Some(1));
        assert_eq!(coord.tms_y(), 3);
    }

    #[test]
    fn test_wrapped_stays_in_range_at_deep_zoom() {
        let deepest = TileCoordinate::new(-1, 0, 31).wrapped().unwrap();
        assert_eq!(deepest.x, i32::MAX);

        // 2^40 - 1 has no i32 representation.
        assert_eq!(TileCoordinate::new(-1, 0, 40).wrapped(), None);
        assert_eq!(TileCoordinate::new(5, 0, 40).wrapped().map(|c| c.x), Some(5));
    }
}
