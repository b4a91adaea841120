//! # offline-map
//!
//! A slippy map engine: given a camera (latitude, longitude, zoom) it fetches,
//! caches and composites 256px raster tiles onto a drawing surface, and lets a
//! user pan (drag) and zoom (wheel) that camera.
//!
//! The pieces, leaves first:
//! - [`core::projection`]: Web Mercator lat/lng <-> fractional tile math
//! - [`tiles::spiral`]: center-outward ordering of the tiles covering a viewport
//! - [`tiles::cache`]: decoded-image cache with a persistent byte tier and the
//!   data behind the stale-frame guard
//! - [`core::camera`]: the authoritative view state and its clamping rules
//! - [`input`]: drag tracking and debounced wheel zoom
//! - [`rendering`]: the per-frame compositor and drawing surfaces
//! - [`core::map::MapView`]: the widget instance tying all of it together

pub mod core;
pub mod input;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::MapBuilder,
    camera::Camera,
    config::{ConfigOverrides, MapConfig, MapProps},
    geo::{LatLng, Point, Size, TileCoord},
    map::MapView,
};

pub use crate::input::{events::InputEvent, handler::InputController};

pub use crate::rendering::{renderer::Renderer, surface::Surface};

pub use crate::tiles::{cache::TileCache, source::TileKey, spiral::spiral};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error type alias for convenience
pub type Error = MapError;
