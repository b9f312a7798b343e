//! Leaflet-style tile lifecycle for [`GridLayer`]
//!
//! Host map events map onto the methods here: `on_move`/`on_move_end` run
//! a (throttled) update, `on_view_reset` resets, `on_zoom_anim`/`on_zoom_end`
//! drive the zoom transition buffer. Every time-dependent method has an
//! `*_at` form taking the current instant.

use super::{
    buffer::{BufferPreparation, ZoomAnimEvent, ZoomTransitionBuffer},
    events::GridEvent,
    GridLayer,
};
use crate::{
    core::{bounds::TileBounds, scheduler::UpdateScheduler},
    prelude::Instant,
    tiles::{
        key::TileKey,
        loader::{TileOutcome, TileRequest, TileResolution},
        set::TileRecord,
    },
    traits::{MapView, TileFetcher, TileRenderer},
    Result,
};

impl<R, F> GridLayer<R, F>
where
    R: TileRenderer,
    F: TileFetcher<R::Visual>,
{
    /// Attach the layer to a map and load the tiles of the current view.
    pub fn on_add<V: MapView + ?Sized>(&mut self, view: &V) -> Result<()> {
        self.on_add_at(view, Instant::now())
    }

    pub fn on_add_at<V: MapView + ?Sized>(&mut self, view: &V, now: Instant) -> Result<()> {
        if self.attached {
            return Ok(());
        }

        self.init_container();
        if let Some(container) = &self.container {
            self.renderer.mount(container);
        }

        self.scheduler = if self.options.update_when_idle {
            None
        } else {
            Some(UpdateScheduler::new(self.options.update_interval()))
        };

        self.attached = true;
        self.reset(view, false);
        self.request_update_at(view, now)
    }

    /// Detach from the map; later updates are no-ops until added again.
    pub fn on_remove(&mut self) {
        if !self.attached {
            return;
        }
        if let Some(container) = &self.container {
            self.renderer.unmount(container);
        }
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.cancel();
        }
        self.attached = false;
    }

    fn init_container(&mut self) {
        if self.container.is_some() {
            return;
        }

        let container = self.renderer.create_container(None);
        if let Some(z_index) = self.options.z_index {
            self.renderer.set_z_index(&container, z_index);
        }

        if self.options.zoom_animation {
            let back = self.renderer.create_container(Some(&container));
            let front = self.renderer.create_container(Some(&container));
            self.buffer = Some(ZoomTransitionBuffer::new(
                front,
                back,
                self.options.buffer_clear_delay(),
            ));
        }

        if self.options.opacity < 1.0 {
            self.renderer
                .set_opacity(&container, self.options.clamped_opacity());
        }

        self.container = Some(container);
    }

    /// Drop every tracked tile; `hard` also empties the back buffer unless
    /// the host or the layer is mid-zoom.
    ///
    /// The pending counter is zeroed without an `all-loaded` notification.
    pub fn reset<V: MapView + ?Sized>(&mut self, view: &V, hard: bool) {
        let removed = self.tiles.clear();
        if !removed.is_empty() {
            log::debug!("reset: unloading {} tiles (hard: {})", removed.len(), hard);
        }

        for (key, mut record) in removed {
            if record.is_pending() {
                self.fetcher.release(&key, &record.visual);
            }
            record.mark_removed();
            self.events.emit(GridEvent::TileUnloaded { coord: record.coord });
        }

        self.pending = 0;
        self.tile_zoom = None;

        if let Some(front) = front_of(&self.buffer, &self.container) {
            self.renderer.clear(front);
        }

        if hard {
            if let Some(buffer) = self.buffer.as_mut() {
                let zooming = view.is_zooming() || buffer.is_animating();
                buffer.clear(zooming, &mut self.renderer);
            }
        }
    }

    /// Hard reset followed by a fresh update.
    pub fn redraw<V: MapView + ?Sized>(&mut self, view: &V) -> Result<()> {
        self.redraw_at(view, Instant::now())
    }

    pub fn redraw_at<V: MapView + ?Sized>(&mut self, view: &V, now: Instant) -> Result<()> {
        if !self.attached {
            return Ok(());
        }
        self.reset(view, true);
        self.request_update_at(view, now)
    }

    /// Recompute the tile plan for `view` and add or evict tiles, unthrottled.
    pub fn update<V: MapView + ?Sized>(&mut self, view: &V) -> Result<()> {
        self.update_at(view, Instant::now())
    }

    pub fn update_at<V: MapView + ?Sized>(&mut self, view: &V, now: Instant) -> Result<()> {
        if !self.attached {
            return Ok(());
        }

        let zoom = view.zoom();
        if !self.options.zoom_in_range(zoom) {
            log::trace!("skipping update: zoom {} outside layer range", zoom);
            return Ok(());
        }

        let tile_zoom = zoom.round() as u8;
        if self.tile_zoom.is_some_and(|z| z != tile_zoom) {
            // Keys only identify tiles within one zoom.
            log::debug!("zoom changed to {} without a view reset", tile_zoom);
            self.reset(view, false);
        }
        self.tile_zoom = Some(tile_zoom);

        let required = self.planner.tile_bounds(&view.pixel_bounds());
        let tiles = &self.tiles;
        let validator = &self.validator;
        let queue = self.planner.plan_range(&required, tile_zoom, |coord| {
            !tiles.contains(&coord.key()) && validator.is_valid(coord, view)
        });

        if !queue.is_empty() {
            log::debug!("adding {} tiles at zoom {}", queue.len(), tile_zoom);

            if self.pending == 0 {
                self.events.emit(GridEvent::LoadingStarted);
            }

            let origin = view.pixel_origin();
            let tile_size = self.options.tile_size as f64;

            for coord in queue {
                let key = coord.key();
                let ticket = self.next_ticket();
                let visual = self.renderer.create_visual(&coord);
                let position = coord.as_point().multiply(tile_size).subtract(&origin);
                self.renderer.set_position(&visual, position);

                // Track the tile before its asset can possibly resolve.
                self.tiles
                    .insert(key, TileRecord::pending(coord, visual, ticket, now))
                    .map_err(|e| {
                        log::error!("tile set out of sync with plan: {}", e);
                        e
                    })?;
                self.pending += 1;

                let front = front_of(&self.buffer, &self.container);
                if let (Some(front), Some(record)) = (front, self.tiles.get(&key)) {
                    self.renderer.attach(&record.visual, front);
                    let request = TileRequest { key, coord, ticket };
                    self.fetcher.request(&request, &record.visual);
                }
            }
        }

        if self.options.unload_invisible_tiles {
            self.remove_other_tiles(&required, now);
        }

        Ok(())
    }

    /// Update now if the throttle allows, otherwise leave a trailing update
    /// for [`GridLayer::tick`].
    pub fn request_update_at<V: MapView + ?Sized>(&mut self, view: &V, now: Instant) -> Result<()> {
        let run = match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.try_acquire(now),
            None => true,
        };
        if run {
            self.update_at(view, now)
        } else {
            Ok(())
        }
    }

    fn remove_other_tiles(&mut self, required: &TileBounds, now: Instant) {
        let outside: Vec<TileKey> = self
            .tiles
            .iter()
            .filter(|(key, _)| !required.contains(key.column(), key.row()))
            .map(|(key, _)| *key)
            .collect();

        for key in outside {
            // Keys come from the set itself.
            let _ = self.evict_at(&key, now);
        }
    }

    /// Remove a tracked tile, detach its visual and release its asset.
    pub fn evict(&mut self, key: &TileKey) -> Result<()> {
        self.evict_at(key, Instant::now())
    }

    pub fn evict_at(&mut self, key: &TileKey, now: Instant) -> Result<()> {
        let mut record = self.tiles.remove(key)?;
        let was_pending = record.is_pending();

        self.renderer.detach(&record.visual);
        self.fetcher.release(key, &record.visual);
        record.mark_removed();
        log::debug!("evicted tile {} (pending: {})", record.coord, was_pending);

        self.events.emit(GridEvent::TileUnloaded { coord: record.coord });

        // An evicted pending tile will never resolve.
        if was_pending {
            self.tile_settled(now);
        }
        Ok(())
    }

    /// Apply an asset result for `key`; untracked or settled tiles are ignored.
    pub fn resolve_tile(&mut self, key: &TileKey, outcome: TileOutcome) -> bool {
        self.resolve_tile_at(key, outcome, Instant::now())
    }

    pub fn resolve_tile_at(&mut self, key: &TileKey, outcome: TileOutcome, now: Instant) -> bool {
        self.resolve_at(
            TileResolution {
                key: *key,
                ticket: None,
                outcome,
            },
            now,
        )
    }

    pub fn resolve(&mut self, resolution: TileResolution) -> bool {
        self.resolve_at(resolution, Instant::now())
    }

    pub fn resolve_at(&mut self, resolution: TileResolution, now: Instant) -> bool {
        let TileResolution { key, ticket, outcome } = resolution;

        let Some(record) = self.tiles.get_mut(&key) else {
            log::trace!("ignoring resolution for untracked tile {}", key);
            return false;
        };
        if ticket.is_some_and(|ticket| ticket != record.ticket) {
            log::trace!("ignoring stale resolution for tile {}", key);
            return false;
        }
        if !record.is_pending() {
            log::trace!("tile {} already resolved", key);
            return false;
        }

        let coord = record.coord;
        match outcome {
            TileOutcome::Loaded(data) => {
                record.mark_loaded(now);
                self.renderer.show_loaded(&record.visual, data.as_ref());
                self.events.emit(GridEvent::TileLoaded { coord });
            }
            TileOutcome::Failed(error) => {
                record.mark_error(now);
                self.renderer.show_placeholder(&record.visual);
                log::warn!("tile {} failed to load: {}", coord, error);
                self.events.emit(GridEvent::TileErrored { coord, error });
            }
        }

        self.tile_settled(now);
        true
    }

    /// Apply every resolution queued by fetchers; returns how many applied.
    pub fn process_resolutions(&mut self) -> usize {
        self.process_resolutions_at(Instant::now())
    }

    pub fn process_resolutions_at(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        for resolution in self.resolutions.drain() {
            if self.resolve_at(resolution, now) {
                applied += 1;
            }
        }
        applied
    }

    fn tile_settled(&mut self, now: Instant) {
        if self.pending == 0 {
            log::error!("pending tile counter already at zero");
            return;
        }
        self.pending -= 1;

        if self.pending == 0 {
            self.events.emit(GridEvent::AllLoaded);
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.schedule_clear(now);
            }
        }
    }

    /// Run deferred work that has come due: the trailing throttled update and
    /// the delayed back-buffer clear.
    pub fn tick<V: MapView + ?Sized>(&mut self, view: &V) -> Result<()> {
        self.tick_at(view, Instant::now())
    }

    pub fn tick_at<V: MapView + ?Sized>(&mut self, view: &V, now: Instant) -> Result<()> {
        let trailing = self
            .scheduler
            .as_mut()
            .is_some_and(|scheduler| scheduler.take_trailing(now));
        let updated = if trailing {
            self.update_at(view, now)
        } else {
            Ok(())
        };

        // A failed update must not hold back a due clear.
        if let Some(buffer) = self.buffer.as_mut() {
            let zooming = view.is_zooming() || buffer.is_animating();
            if buffer.clear_if_due(now, zooming, &mut self.renderer) {
                log::debug!("back buffer cleared");
            }
        }
        updated
    }

    /// The map moved; ignored when only updating once movement ends.
    pub fn on_move<V: MapView + ?Sized>(&mut self, view: &V) -> Result<()> {
        self.on_move_at(view, Instant::now())
    }

    pub fn on_move_at<V: MapView + ?Sized>(&mut self, view: &V, now: Instant) -> Result<()> {
        if self.options.update_when_idle {
            return Ok(());
        }
        self.request_update_at(view, now)
    }

    pub fn on_move_end<V: MapView + ?Sized>(&mut self, view: &V) -> Result<()> {
        self.on_move_end_at(view, Instant::now())
    }

    pub fn on_move_end_at<V: MapView + ?Sized>(&mut self, view: &V, now: Instant) -> Result<()> {
        self.request_update_at(view, now)
    }

    pub fn on_view_reset<V: MapView + ?Sized>(&mut self, view: &V, hard: bool) {
        if self.attached {
            self.reset(view, hard);
        }
    }

    /// One frame of a zoom animation.
    pub fn on_zoom_anim(&mut self, event: &ZoomAnimEvent) {
        self.on_zoom_anim_at(event, Instant::now())
    }

    pub fn on_zoom_anim_at(&mut self, event: &ZoomAnimEvent, now: Instant) {
        if !self.attached {
            return;
        }

        let front_share = self.tiles.loaded_share();
        let preparation = match self.buffer.as_mut() {
            Some(buffer) => buffer.begin(front_share, &mut self.renderer),
            None => return,
        };

        if let Some(preparation) = preparation {
            // Tracked tiles live in the container being retired.
            self.stop_loading_tiles(now);

            let retired_share = self.tiles.loaded_share();
            if let Some(buffer) = self.buffer.as_mut() {
                if preparation == BufferPreparation::Swapped {
                    buffer.set_back_loaded_share(retired_share);
                }
                buffer.cancel_clear();
            }
        }

        if let Some(buffer) = self.buffer.as_mut() {
            buffer.animate(event, &mut self.renderer);
        }
    }

    pub fn on_zoom_end(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.end(&mut self.renderer);
        }
    }

    /// Evict every tile whose asset is still loading.
    ///
    /// Evicted tiles settle, so stopping the last pending ones raises
    /// `all-loaded` even when none of them loaded. The back-buffer clear that
    /// schedules is cancelled by the caller.
    fn stop_loading_tiles(&mut self, now: Instant) {
        let loading: Vec<TileKey> = self
            .tiles
            .iter()
            .filter(|(_, record)| record.is_pending())
            .map(|(key, _)| *key)
            .collect();

        if !loading.is_empty() {
            log::debug!("stopping {} loading tiles", loading.len());
        }
        for key in loading {
            let _ = self.evict_at(&key, now);
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.options.opacity = opacity;
        if let Some(container) = &self.container {
            self.renderer
                .set_opacity(container, self.options.clamped_opacity());
        }
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.options.z_index = Some(z_index);
        if let Some(container) = &self.container {
            self.renderer.set_z_index(container, z_index);
        }
    }
}

/// Container new tiles are attached to: the buffer's front, or the layer
/// container itself when zoom animation is off.
fn front_of<'a, C>(buffer: &'a Option<ZoomTransitionBuffer<C>>, container: &'a Option<C>) -> Option<&'a C> {
    match buffer {
        Some(buffer) => Some(buffer.front()),
        None => container.as_ref(),
    }
}
