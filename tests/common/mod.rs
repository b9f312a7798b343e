//! Recording test doubles for the grid layer's collaborators.

#![allow(dead_code)]

use std::collections::HashMap;

use crossbeam_channel::Receiver;
use tilegrid::prelude::*;

pub const TILE: f64 = 256.0;

/// A visual the renderer handed out.
#[derive(Debug, Clone)]
pub struct RecordedVisual {
    pub coord: TileCoordinate,
    pub parent: Option<usize>,
    pub position: Option<Point>,
    pub loaded: bool,
    pub placeholder: bool,
}

#[derive(Debug, Clone)]
pub struct RecordedContainer {
    pub parent: Option<usize>,
    pub mounted: bool,
    pub visible: bool,
    pub z_index: Option<i32>,
    pub transform: Option<ZoomTransform>,
    pub opacity: f32,
    pub clears: usize,
}

/// Renderer that keeps every visual and container in plain maps.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub visuals: HashMap<u64, RecordedVisual>,
    pub containers: Vec<RecordedContainer>,
    pub detached: Vec<TileCoordinate>,
    next_visual: u64,
}

impl RecordingRenderer {
    pub fn container(&self, id: usize) -> &RecordedContainer {
        &self.containers[id]
    }

    /// Tiles currently attached to `container`, as sorted (x, y) pairs.
    pub fn tiles_in(&self, container: usize) -> Vec<(i32, i32)> {
        let mut tiles: Vec<(i32, i32)> = self
            .visuals
            .values()
            .filter(|visual| visual.parent == Some(container))
            .map(|visual| (visual.coord.x, visual.coord.y))
            .collect();
        tiles.sort();
        tiles
    }

    pub fn visual_for(&self, x: i32, y: i32) -> Option<&RecordedVisual> {
        self.visuals
            .values()
            .find(|visual| visual.coord.x == x && visual.coord.y == y && visual.parent.is_some())
    }
}

impl TileRenderer for RecordingRenderer {
    type Visual = u64;
    type Container = usize;

    fn create_container(&mut self, parent: Option<&usize>) -> usize {
        self.containers.push(RecordedContainer {
            parent: parent.copied(),
            mounted: false,
            visible: true,
            z_index: None,
            transform: None,
            opacity: 1.0,
            clears: 0,
        });
        self.containers.len() - 1
    }

    fn mount(&mut self, container: &usize) {
        self.containers[*container].mounted = true;
    }

    fn unmount(&mut self, container: &usize) {
        self.containers[*container].mounted = false;
    }

    fn create_visual(&mut self, coord: &TileCoordinate) -> u64 {
        self.next_visual += 1;
        self.visuals.insert(
            self.next_visual,
            RecordedVisual {
                coord: *coord,
                parent: None,
                position: None,
                loaded: false,
                placeholder: false,
            },
        );
        self.next_visual
    }

    fn attach(&mut self, visual: &u64, parent: &usize) {
        if let Some(recorded) = self.visuals.get_mut(visual) {
            recorded.parent = Some(*parent);
        }
    }

    fn detach(&mut self, visual: &u64) {
        if let Some(recorded) = self.visuals.remove(visual) {
            self.detached.push(recorded.coord);
        }
    }

    fn set_position(&mut self, visual: &u64, position: Point) {
        if let Some(recorded) = self.visuals.get_mut(visual) {
            recorded.position = Some(position);
        }
    }

    fn clear(&mut self, container: &usize) {
        self.visuals.retain(|_, visual| visual.parent != Some(*container));
        self.containers[*container].clears += 1;
    }

    fn set_visible(&mut self, container: &usize, visible: bool) {
        self.containers[*container].visible = visible;
    }

    fn set_z_index(&mut self, container: &usize, z_index: i32) {
        self.containers[*container].z_index = Some(z_index);
    }

    fn set_transform(&mut self, container: &usize, transform: Option<&ZoomTransform>) {
        self.containers[*container].transform = transform.copied();
    }

    fn set_opacity(&mut self, container: &usize, opacity: f32) {
        self.containers[*container].opacity = opacity;
    }

    fn show_loaded(&mut self, visual: &u64, _data: Option<&TileData>) {
        if let Some(recorded) = self.visuals.get_mut(visual) {
            recorded.loaded = true;
        }
    }

    fn show_placeholder(&mut self, visual: &u64) {
        if let Some(recorded) = self.visuals.get_mut(visual) {
            recorded.placeholder = true;
        }
    }
}

/// Fetcher that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    pub requests: Vec<TileRequest>,
    pub released: Vec<TileKey>,
}

impl RecordingFetcher {
    pub fn requested(&self) -> Vec<(i32, i32)> {
        self.requests.iter().map(|r| (r.coord.x, r.coord.y)).collect()
    }

    pub fn last_request_for(&self, x: i32, y: i32) -> Option<&TileRequest> {
        self.requests
            .iter()
            .rev()
            .find(|r| r.coord.x == x && r.coord.y == y)
    }
}

impl<V> TileFetcher<V> for RecordingFetcher {
    fn request(&mut self, request: &TileRequest, _visual: &V) {
        self.requests.push(request.clone());
    }

    fn release(&mut self, key: &TileKey, _visual: &V) {
        self.released.push(*key);
    }
}

/// Map view with fixed pixel bounds and Web Mercator unprojection.
#[derive(Debug, Clone)]
pub struct FixedView {
    pub bounds: Bounds,
    pub zoom: f64,
    pub origin: Point,
    pub zooming: bool,
}

impl FixedView {
    /// View whose pixel bounds cover exactly the tile rectangle given.
    pub fn tiles(min_x: i32, min_y: i32, max_x: i32, max_y: i32, zoom: f64) -> Self {
        let bounds = Bounds::from_coords(
            min_x as f64 * TILE,
            min_y as f64 * TILE,
            (max_x + 1) as f64 * TILE - 1.0,
            (max_y + 1) as f64 * TILE - 1.0,
        );
        Self {
            origin: bounds.min,
            bounds,
            zoom,
            zooming: false,
        }
    }
}

impl MapView for FixedView {
    fn pixel_bounds(&self) -> Bounds {
        self.bounds.clone()
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn pixel_origin(&self) -> Point {
        self.origin
    }

    fn unproject(&self, point: &Point, zoom: f64) -> LatLng {
        tilegrid::core::geo::unproject(point, zoom)
    }

    fn is_zooming(&self) -> bool {
        self.zooming
    }
}

pub type TestLayer = GridLayer<RecordingRenderer, RecordingFetcher>;

pub fn layer(options: GridLayerOptions) -> TestLayer {
    let _ = env_logger::builder().is_test(true).try_init();
    GridLayer::new(options, RecordingRenderer::default(), RecordingFetcher::default())
        .expect("valid options")
}

pub fn drain(events: &Receiver<GridEvent>) -> Vec<GridEvent> {
    events.try_iter().collect()
}

pub fn count(events: &[GridEvent], kind: GridEventKind) -> usize {
    events.iter().filter(|event| event.kind() == kind).count()
}

pub fn loaded() -> TileOutcome {
    TileOutcome::Loaded(None)
}

pub fn failed() -> TileOutcome {
    TileOutcome::Failed("404".to_string())
}
