//! Configuration for a map view
//!
//! [`MapConfig`] carries the documented defaults. Hosts supply a partial
//! [`ConfigOverrides`] (typically deserialized from JSON) and merge it in with
//! [`MapConfig::merged`]. Camera and overlay props live in [`MapProps`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_MAP_SERVER, DEFAULT_ZOOM, MAX_PREFETCH_BUFFER,
    MIN_CANVAS_HEIGHT, MIN_CANVAS_WIDTH, PREFETCH_BUFFER, WHEEL_ZOOM_DIVISOR, ZOOM_DEBOUNCE,
};
use crate::core::geo::{LatLng, Size};
use crate::rendering::surface::Color;
use crate::{MapError, Result};

/// Wheel and drag tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Quiet period before a wheel gesture commits, in milliseconds
    pub zoom_debounce_ms: u64,
    /// Wheel delta units per zoom level
    pub wheel_zoom_divisor: f64,
    /// Fixed degrees per dragged pixel; `None` uses `1 / 2^zoom`
    pub pan_scale: Option<f64>,
}

impl InteractionConfig {
    pub fn zoom_debounce(&self) -> Duration {
        Duration::from_millis(self.zoom_debounce_ms)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            zoom_debounce_ms: ZOOM_DEBOUNCE.as_millis() as u64,
            wheel_zoom_divisor: WHEEL_ZOOM_DIVISOR,
            pan_scale: None,
        }
    }
}

/// Which tiles get requested per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    /// Extra tiles beyond the visible area on each axis
    pub prefetch_buffer: u32,
    /// The canvas never shrinks below this
    pub min_canvas: Size,
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        Self {
            prefetch_buffer: PREFETCH_BUFFER,
            min_canvas: Size::new(MIN_CANVAS_WIDTH, MIN_CANVAS_HEIGHT),
        }
    }
}

/// Complete configuration of a map view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Report `"lat, lng, zoom"` with every frame
    pub show_coordinates: bool,
    /// Mark the canvas center
    pub show_center: bool,
    /// Root of the `{z}/{x}/{y}.png` tile server
    pub map_server: String,
    /// Outline every painted tile
    pub show_tile_borders: bool,
    /// Read and write the persistent tile store
    pub use_offline_cache: bool,
    pub interaction: InteractionConfig,
    pub tiles: TileLoadingConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            show_coordinates: true,
            show_center: true,
            map_server: DEFAULT_MAP_SERVER.to_string(),
            show_tile_borders: false,
            use_offline_cache: true,
            interaction: InteractionConfig::default(),
            tiles: TileLoadingConfig::default(),
        }
    }
}

/// Partial configuration; every `Some` field replaces the default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub show_coordinates: Option<bool>,
    pub show_center: Option<bool>,
    pub map_server: Option<String>,
    #[serde(alias = "showOSMBorders")]
    pub show_tile_borders: Option<bool>,
    pub use_offline_cache: Option<bool>,
    pub zoom_debounce_ms: Option<u64>,
    pub wheel_zoom_divisor: Option<f64>,
    pub pan_scale: Option<f64>,
    pub prefetch_buffer: Option<u32>,
}

impl ConfigOverrides {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl MapConfig {
    /// Defaults with `overrides` applied on top
    pub fn from_overrides(overrides: &ConfigOverrides) -> Self {
        Self::default().merged(overrides)
    }

    /// Applies every `Some` field of `overrides`
    pub fn merged(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(value) = overrides.show_coordinates {
            self.show_coordinates = value;
        }
        if let Some(value) = overrides.show_center {
            self.show_center = value;
        }
        if let Some(value) = &overrides.map_server {
            self.map_server = value.clone();
        }
        if let Some(value) = overrides.show_tile_borders {
            self.show_tile_borders = value;
        }
        if let Some(value) = overrides.use_offline_cache {
            self.use_offline_cache = value;
        }
        if let Some(value) = overrides.zoom_debounce_ms {
            self.interaction.zoom_debounce_ms = value;
        }
        if let Some(value) = overrides.wheel_zoom_divisor {
            self.interaction.wheel_zoom_divisor = value;
        }
        if overrides.pan_scale.is_some() {
            self.interaction.pan_scale = overrides.pan_scale;
        }
        if let Some(value) = overrides.prefetch_buffer {
            self.tiles.prefetch_buffer = value;
        }
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.map_server.trim().is_empty() {
            return Err(MapError::Config("map server must not be empty".into()));
        }
        let divisor = self.interaction.wheel_zoom_divisor;
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(MapError::Config(format!(
                "wheel zoom divisor must be positive, got {divisor}"
            )));
        }
        if let Some(scale) = self.interaction.pan_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(MapError::Config(format!(
                    "pan scale must be positive, got {scale}"
                )));
            }
        }
        if self.tiles.prefetch_buffer > MAX_PREFETCH_BUFFER {
            return Err(MapError::Config(format!(
                "prefetch buffer must be at most {MAX_PREFETCH_BUFFER}, got {}",
                self.tiles.prefetch_buffer
            )));
        }
        Ok(())
    }
}

/// A world-anchored marker with caller-owned payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapElement<P> {
    pub lat_lng: LatLng,
    pub payload: P,
}

impl<P> MapElement<P> {
    pub fn new(lat_lng: LatLng, payload: P) -> Self {
        Self { lat_lng, payload }
    }
}

/// A polyline overlay; `color` defaults to black.
///
/// Drawn open: the last point is not joined back to the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapLine {
    pub color: Option<Color>,
    pub coordinates: Vec<LatLng>,
}

impl MapLine {
    pub fn new(coordinates: Vec<LatLng>) -> Self {
        Self {
            color: None,
            coordinates,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Initial camera and overlays of a map view
#[derive(Debug, Clone, PartialEq)]
pub struct MapProps<P = ()> {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub map_elements: Vec<MapElement<P>>,
    pub map_lines: Vec<MapLine>,
}

impl<P> Default for MapProps<P> {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            zoom: DEFAULT_ZOOM,
            map_elements: Vec::new(),
            map_lines: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert!(config.show_coordinates);
        assert!(config.show_center);
        assert!(!config.show_tile_borders);
        assert!(config.use_offline_cache);
        assert_eq!(config.map_server, "https://tile.openstreetmap.org");
        assert_eq!(config.interaction.zoom_debounce(), Duration::from_millis(100));
        assert_eq!(config.tiles.min_canvas, Size::new(800, 600));
        assert!(config.validate().is_ok());

        let props: MapProps = MapProps::default();
        assert_eq!((props.latitude, props.longitude, props.zoom), (49.2827, -123.1207, 12));
    }

    #[test]
    fn test_overrides_from_json() {
        let overrides = ConfigOverrides::from_json(
            r#"{ "showCenter": false, "mapServer": "http://localhost:8080", "showOSMBorders": true }"#,
        )
        .unwrap();
        let config = MapConfig::from_overrides(&overrides);

        assert!(!config.show_center);
        assert!(config.show_coordinates);
        assert!(config.show_tile_borders);
        assert_eq!(config.map_server, "http://localhost:8080");
    }

    #[test]
    fn test_partial_config_json_uses_defaults() {
        let config = MapConfig::from_json(r#"{ "show_coordinates": false }"#).unwrap();
        assert!(!config.show_coordinates);
        assert_eq!(config.interaction, InteractionConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = MapConfig::default();
        config.map_server = "  ".into();
        assert!(matches!(config.validate(), Err(MapError::Config(_))));

        let config = MapConfig::default().merged(&ConfigOverrides {
            wheel_zoom_divisor: Some(0.0),
            ..Default::default()
        });
        assert!(config.validate().is_err());

        assert!(ConfigOverrides::from_json("{ not json").is_err());

        let config = MapConfig::default().merged(&ConfigOverrides {
            prefetch_buffer: Some(u32::MAX),
            ..Default::default()
        });
        assert!(matches!(config.validate(), Err(MapError::Config(_))));
        let config = MapConfig::default().merged(&ConfigOverrides {
            prefetch_buffer: Some(64),
            ..Default::default()
        });
        assert!(config.validate().is_ok());
    }
}
