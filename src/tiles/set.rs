//! Keyed membership of the tiles a layer currently tracks.

use crate::{
    prelude::{HashMap, HashSet, Instant},
    tiles::{
        key::{TileCoordinate, TileKey},
        loader::RequestTicket,
    },
    GridError, Result,
};

/// Lifecycle of a tracked tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileStatus {
    /// Visual created, asset requested.
    Pending,
    Loaded,
    /// Asset failed; the placeholder is showing.
    Errored,
    /// Evicted; the record is no longer in any set.
    Removed,
}

impl TileStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TileStatus::Loaded | TileStatus::Errored)
    }
}

/// A tracked tile and the visual element it owns.
#[derive(Debug)]
pub struct TileRecord<V> {
    pub coord: TileCoordinate,
    pub visual: V,
    pub status: TileStatus,
    pub ticket: RequestTicket,
    pub requested_at: Instant,
    pub resolved_at: Option<Instant>,
}

impl<V> TileRecord<V> {
    pub fn pending(coord: TileCoordinate, visual: V, ticket: RequestTicket, now: Instant) -> Self {
        Self {
            coord,
            visual,
            status: TileStatus::Pending,
            ticket,
            requested_at: now,
            resolved_at: None,
        }
    }

    pub fn key(&self) -> TileKey {
        self.coord.key()
    }

    pub fn is_pending(&self) -> bool {
        self.status == TileStatus::Pending
    }

    pub fn mark_loaded(&mut self, now: Instant) {
        self.status = TileStatus::Loaded;
        self.resolved_at = Some(now);
    }

    pub fn mark_error(&mut self, now: Instant) {
        self.status = TileStatus::Errored;
        self.resolved_at = Some(now);
    }

    pub fn mark_removed(&mut self) {
        self.status = TileStatus::Removed;
    }
}

/// Mapping from tile key to tile record.
///
/// Pure bookkeeping: unload notifications and resource cleanup for removed
/// records are the caller's job.
#[derive(Debug)]
pub struct TileSet<V> {
    tiles: HashMap<TileKey, TileRecord<V>>,
}

impl<V> Default for TileSet<V> {
    fn default() -> Self {
        Self {
            tiles: HashMap::default(),
        }
    }
}

impl<V> TileSet<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.tiles.contains_key(key)
    }

    pub fn get(&self, key: &TileKey) -> Option<&TileRecord<V>> {
        self.tiles.get(key)
    }

    pub fn get_mut(&mut self, key: &TileKey) -> Option<&mut TileRecord<V>> {
        self.tiles.get_mut(key)
    }

    /// Track a new record; an already tracked key is an ordering bug upstream.
    pub fn insert(&mut self, key: TileKey, record: TileRecord<V>) -> Result<()> {
        if self.tiles.contains_key(&key) {
            return Err(GridError::DuplicateKey(key));
        }
        self.tiles.insert(key, record);
        Ok(())
    }

    pub fn remove(&mut self, key: &TileKey) -> Result<TileRecord<V>> {
        self.tiles.remove(key).ok_or(GridError::NotFound(*key))
    }

    /// Remove every record, handing them back for cleanup notifications.
    pub fn clear(&mut self) -> Vec<(TileKey, TileRecord<V>)> {
        self.tiles.drain().collect()
    }

    pub fn size(&self) -> usize {
        self.tiles.len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn keys(&self) -> HashSet<TileKey> {
        self.tiles.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileKey, &TileRecord<V>)> {
        self.tiles.iter()
    }

    /// Number of records still waiting on their asset.
    pub fn pending_count(&self) -> usize {
        self.tiles.values().filter(|record| record.is_pending()).count()
    }

    /// Share of tracked records whose asset has resolved; 0.0 when empty.
    pub fn loaded_share(&self) -> f64 {
        if self.tiles.is_empty() {
            return 0.0;
        }
        let resolved = self
            .tiles
            .values()
            .filter(|record| record.status.is_resolved())
            .count();
        resolved as f64 / self.tiles.len() as f64
    }
}
