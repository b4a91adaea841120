//! Prelude module for common offline-map types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use offline_map::prelude::*;`

pub use crate::core::{
    builder::MapBuilder,
    camera::{Camera, WheelAccumulator},
    config::{
        ConfigOverrides, InteractionConfig, MapConfig, MapElement, MapLine, MapProps,
        TileLoadingConfig,
    },
    geo::{LatLng, Point, Rect, Size, TileCoord},
    map::{MapView, TilePoll},
    projection::{lat_lng_to_tile, tile_to_lat_lng},
};

pub use crate::input::{reduce, Action, InputController, InputEvent, ViewState};

pub use crate::rendering::{
    Color, FrameReport, RasterSurface, RecordingSurface, Renderer, Surface,
};

pub use crate::runtime::{AsyncSpawner, QueuedSpawner};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioSpawner;

pub use crate::tiles::{
    spiral, HttpFetcher, MemoryStore, PersistentStore, TileCache, TileFetcher, TileImage,
    TileKey, TileLookup, XyzServer,
};

pub use crate::{MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};
