//! Notifications a grid layer raises while it manages its tiles.

use crate::{prelude::HashMap, tiles::key::TileCoordinate};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event raised by a grid layer
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// A batch of tiles started loading while nothing else was pending.
    LoadingStarted,
    TileLoaded { coord: TileCoordinate },
    /// The tile's asset failed and its placeholder is showing.
    TileErrored { coord: TileCoordinate, error: String },
    /// The last pending tile resolved.
    AllLoaded,
    TileUnloaded { coord: TileCoordinate },
}

impl GridEvent {
    pub fn kind(&self) -> GridEventKind {
        match self {
            GridEvent::LoadingStarted => GridEventKind::LoadingStarted,
            GridEvent::TileLoaded { .. } => GridEventKind::TileLoaded,
            GridEvent::TileErrored { .. } => GridEventKind::TileErrored,
            GridEvent::AllLoaded => GridEventKind::AllLoaded,
            GridEvent::TileUnloaded { .. } => GridEventKind::TileUnloaded,
        }
    }

    /// The tile the event is about, for per-tile events.
    pub fn coord(&self) -> Option<&TileCoordinate> {
        match self {
            GridEvent::TileLoaded { coord }
            | GridEvent::TileErrored { coord, .. }
            | GridEvent::TileUnloaded { coord } => Some(coord),
            GridEvent::LoadingStarted | GridEvent::AllLoaded => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridEventKind {
    LoadingStarted,
    TileLoaded,
    TileErrored,
    AllLoaded,
    TileUnloaded,
}

impl GridEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridEventKind::LoadingStarted => "loading-started",
            GridEventKind::TileLoaded => "tile-loaded",
            GridEventKind::TileErrored => "tile-errored",
            GridEventKind::AllLoaded => "all-loaded",
            GridEventKind::TileUnloaded => "tile-unloaded",
        }
    }
}

impl fmt::Display for GridEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event listener callback type
pub type GridEventCallback = Box<dyn Fn(&GridEvent) + Send + Sync>;

/// Listener registry of a grid layer.
///
/// Events are dispatched as soon as they are emitted: callbacks run inline
/// on the layer's thread, channel subscribers receive a copy to drain later.
#[derive(Default)]
pub struct GridEvents {
    listeners: HashMap<GridEventKind, Vec<GridEventCallback>>,
    any: Vec<GridEventCallback>,
    subscribers: Vec<Sender<GridEvent>>,
}

impl GridEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of event
    pub fn on<F>(&mut self, kind: GridEventKind, callback: F)
    where
        F: Fn(&GridEvent) + Send + Sync + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(callback));
    }

    /// Register a listener for every event
    pub fn on_any<F>(&mut self, callback: F)
    where
        F: Fn(&GridEvent) + Send + Sync + 'static,
    {
        self.any.push(Box::new(callback));
    }

    /// Remove every listener registered for `kind`
    pub fn off(&mut self, kind: GridEventKind) {
        self.listeners.remove(&kind);
    }

    /// Channel receiving a copy of every event from now on.
    pub fn subscribe(&mut self) -> Receiver<GridEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    pub fn listener_count(&self, kind: GridEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len) + self.any.len()
    }

    pub fn emit(&mut self, event: GridEvent) {
        log::trace!("grid event: {}", event.kind());

        if let Some(callbacks) = self.listeners.get(&event.kind()) {
            for callback in callbacks {
                callback(&event);
            }
        }
        for callback in &self.any {
            callback(&event);
        }

        // Dropped receivers unsubscribe themselves.
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

impl fmt::Debug for GridEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridEvents")
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("any", &self.any.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
