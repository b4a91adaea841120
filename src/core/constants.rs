//! Engine-wide constants derived from the OpenStreetMap slippy-map conventions.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

use std::time::Duration;

/// Square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Lowest zoom level whose tiles are fetched.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level whose tiles are fetched.
pub const MAX_ZOOM: u8 = 18;

/// The camera latitude saturates here. The projection diverges at the poles.
pub const MAX_LATITUDE: f64 = 85.0;

/// The camera longitude saturates here (no antimeridian wraparound).
pub const MAX_LONGITUDE: f64 = 180.0;

/// Extra tiles requested beyond the visible area on each axis.
pub const PREFETCH_BUFFER: u32 = 5;

/// Largest accepted prefetch buffer.
pub const MAX_PREFETCH_BUFFER: u32 = 64;

/// Wheel delta units per zoom level.
pub const WHEEL_ZOOM_DIVISOR: f64 = 200.0;

/// Quiet period before an accumulated wheel gesture commits its zoom.
pub const ZOOM_DEBOUNCE: Duration = Duration::from_millis(100);

/// The backing surface is never smaller than this.
pub const MIN_CANVAS_WIDTH: u32 = 800;
pub const MIN_CANVAS_HEIGHT: u32 = 600;

/// Coordinate readout rounding (nine decimal places).
pub const COORDINATE_PRECISION: f64 = 1e9;

/// Public OpenStreetMap tile endpoint.
pub const DEFAULT_MAP_SERVER: &str = "https://tile.openstreetmap.org";

/// Default camera props (downtown Vancouver).
pub const DEFAULT_LATITUDE: f64 = 49.2827;
pub const DEFAULT_LONGITUDE: f64 = -123.1207;
pub const DEFAULT_ZOOM: u8 = 12;
