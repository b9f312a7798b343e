//! Grid layer options
//!
//! Defaults follow Leaflet's grid layer. Options are plain serde data so a
//! host can keep them in its own configuration files and load them with
//! [`GridLayerOptions::from_json`].

use crate::{
    core::{constants, geo::LatLngBounds},
    GridError, Result,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How per-axis bounds checks combine into tile validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Valid when either axis passes (Leaflet's historical behaviour).
    #[default]
    AnyAxis,
    /// Valid only when both axes pass.
    AllAxes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayerOptions {
    pub tile_size: u32,
    pub opacity: f32,
    pub z_index: Option<i32>,
    /// Evict tiles that leave the required bounds on every update.
    pub unload_invisible_tiles: bool,
    /// Only update when movement ends instead of on every (throttled) move.
    pub update_when_idle: bool,
    pub update_interval_ms: u64,
    pub wrap_x: bool,
    pub wrap_y: bool,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub bounds: Option<LatLngBounds>,
    pub bounds_policy: BoundsPolicy,
    /// Double-buffered containers and animated zoom transitions.
    pub zoom_animation: bool,
    pub buffer_clear_delay_ms: u64,
    pub detect_retina: bool,
}

impl Default for GridLayerOptions {
    fn default() -> Self {
        Self {
            tile_size: constants::TILE_SIZE,
            opacity: 1.0,
            z_index: None,
            unload_invisible_tiles: false,
            update_when_idle: false,
            update_interval_ms: constants::DEFAULT_UPDATE_INTERVAL_MS,
            wrap_x: true,
            wrap_y: false,
            min_zoom: constants::DEFAULT_MIN_ZOOM,
            max_zoom: constants::DEFAULT_MAX_ZOOM,
            bounds: None,
            bounds_policy: BoundsPolicy::AnyAxis,
            zoom_animation: true,
            buffer_clear_delay_ms: constants::BUFFER_CLEAR_DELAY_MS,
            detect_retina: false,
        }
    }
}

impl GridLayerOptions {
    /// Leaflet's touch-device defaults: keep memory low and skip work mid-gesture.
    pub fn mobile() -> Self {
        Self {
            unload_invisible_tiles: true,
            update_when_idle: true,
            ..Self::default()
        }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let options: Self = serde_json::from_value(value)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(GridError::Config("tile_size must be positive".to_string()));
        }
        if self.max_zoom > constants::MAX_TILE_ZOOM {
            return Err(GridError::Config(format!(
                "max_zoom {} is above the deepest supported zoom {}",
                self.max_zoom,
                constants::MAX_TILE_ZOOM
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(GridError::Config(format!(
                "min_zoom {} is greater than max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !self.opacity.is_finite() {
            return Err(GridError::Config("opacity must be a finite number".to_string()));
        }
        Ok(())
    }

    /// Adjust for a high-density display when `detect_retina` is on.
    ///
    /// Tiles are laid out at half their size so each covers the same screen
    /// area at twice the resolution; the zoom range shifts down by one.
    pub fn for_device_pixel_ratio(mut self, ratio: f64) -> Self {
        if self.detect_retina && ratio > 1.0 && self.max_zoom > 0 {
            self.tile_size = (self.tile_size / 2).max(1);
            self.min_zoom = self.min_zoom.saturating_sub(1);
            self.max_zoom -= 1;
        }
        self
    }

    /// Opacity clamped into [0, 1].
    pub fn clamped_opacity(&self) -> f32 {
        self.opacity.clamp(0.0, 1.0)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn buffer_clear_delay(&self) -> Duration {
        Duration::from_millis(self.buffer_clear_delay_ms)
    }

    /// Whether `zoom` lies inside [min_zoom, max_zoom].
    pub fn zoom_in_range(&self, zoom: f64) -> bool {
        zoom >= self.min_zoom as f64 && zoom <= self.max_zoom as f64
    }
}
