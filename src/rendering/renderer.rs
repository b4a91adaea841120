//! Per-frame compositor.
//!
//! A frame clears the surface, fills the background, then walks the spiral of
//! cells around the camera's tile. Every in-range cell is requested from the
//! cache: ready tiles are painted immediately, pending ones are painted later
//! through [`Renderer::paint_tile`] once their completion passes the zoom
//! guard. Overlay lines and the center mark are drawn last.

use std::sync::Arc;

use serde::Serialize;

use crate::core::camera::Camera;
use crate::core::config::{MapConfig, MapElement, MapLine};
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLng, Point, Rect, Size, TileCoord};
use crate::core::projection::lat_lng_to_tile;
use crate::rendering::surface::{Color, Surface};
use crate::tiles::cache::{TileCache, TileLookup};
use crate::tiles::loader::TileImage;
use crate::tiles::source::XyzServer;
use crate::tiles::spiral::{coverage, Spiral};

/// Side of the square center mark in pixels
const CENTER_MARK_SIZE: f64 = 6.0;
const LINE_WIDTH: f64 = 2.0;
const TILE_BORDER_WIDTH: f64 = 0.5;

/// Camera-relative placement of tiles and world points on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub canvas: Size,
    pub zoom: u8,
    /// Fractional tile position of the camera center at `zoom`
    pub camera_tile: Point,
    /// `2^(fractional_zoom - zoom)`, applied about the canvas center
    pub scale: f64,
}

impl FrameGeometry {
    pub fn new(camera: &Camera, canvas: Size) -> Self {
        Self {
            canvas,
            zoom: camera.zoom(),
            camera_tile: camera.tile_position(),
            scale: camera.scale_factor(),
        }
    }

    /// Tile containing the camera center
    pub fn center_tile(&self) -> (i64, i64) {
        let tile = self.camera_tile.floor();
        (tile.x as i64, tile.y as i64)
    }

    /// Canvas position of a fractional tile coordinate at `zoom`
    pub fn tile_point_to_screen(&self, tile: Point) -> Point {
        tile.subtract(&self.camera_tile)
            .multiply(TILE_SIZE as f64 * self.scale)
            .add(&self.canvas.center())
    }

    /// Where the tile `coord` lands on the canvas
    pub fn tile_rect(&self, coord: TileCoord) -> Rect {
        let origin = self.tile_point_to_screen(Point::new(coord.x as f64, coord.y as f64));
        let extent = TILE_SIZE as f64 * self.scale;
        Rect::new(origin.x, origin.y, extent, extent)
    }

    pub fn world_to_screen(&self, lat_lng: LatLng) -> Point {
        self.tile_point_to_screen(lat_lng_to_tile(lat_lng, self.zoom as f64))
    }
}

/// A marker that survived culling
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerPlacement {
    /// Index into the map elements
    pub index: usize,
    /// Canvas position of the marker anchor
    pub position: Point,
}

/// Outcome of one full frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub canvas: Size,
    pub zoom: u8,
    /// In-range cells asked of the cache
    pub requested: usize,
    /// Tiles painted synchronously from the cache
    pub drawn: usize,
    /// Tiles still loading
    pub pending: usize,
    /// Tiles that failed earlier and stay blank
    pub unavailable: usize,
    pub markers: Vec<MarkerPlacement>,
    /// `"lat, lng, zoom"` when coordinates are shown
    pub coordinates: Option<String>,
}

/// Composites tiles and overlays onto a [`Surface`]
#[derive(Debug, Clone)]
pub struct Renderer {
    canvas: Size,
    min_size: Size,
    buffer: u32,
    background: Color,
}

impl Renderer {
    pub fn new(config: &MapConfig) -> Self {
        let min_size = config.tiles.min_canvas;
        Self {
            canvas: min_size,
            min_size,
            buffer: config.tiles.prefetch_buffer,
            background: Color::WHITE,
        }
    }

    /// Sizes the canvas to the container, never below the minimum
    pub fn resize(&mut self, container: Size) -> Size {
        self.canvas = container.at_least(self.min_size);
        self.canvas
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn geometry(&self, camera: &Camera) -> FrameGeometry {
        FrameGeometry::new(camera, self.canvas)
    }

    /// Tiles requested per axis for the current canvas
    pub fn coverage(&self) -> (u32, u32) {
        (
            coverage(self.canvas.width, TILE_SIZE, self.buffer),
            coverage(self.canvas.height, TILE_SIZE, self.buffer),
        )
    }

    /// Draws a complete frame
    pub fn render<P>(
        &self,
        surface: &mut dyn Surface,
        camera: &Camera,
        cache: &mut TileCache,
        config: &MapConfig,
        lines: &[MapLine],
        elements: &[MapElement<P>],
    ) -> FrameReport {
        if surface.size() != self.canvas {
            surface.resize(self.canvas);
        }
        let canvas_rect = self.canvas.rect();
        surface.clear(canvas_rect);
        surface.fill_rect(canvas_rect, self.background);

        let geometry = self.geometry(camera);
        let server = XyzServer::new(config.map_server.as_str());
        let mut report = FrameReport {
            canvas: self.canvas,
            zoom: geometry.zoom,
            ..FrameReport::default()
        };

        let (center_x, center_y) = geometry.center_tile();
        let (width, height) = self.coverage();
        for cell in Spiral::new(width, height) {
            let Some(coord) = TileCoord::checked(center_x + cell.dx, center_y + cell.dy, geometry.zoom)
            else {
                continue;
            };

            report.requested += 1;
            match cache.request(&server.key(coord), geometry.zoom) {
                TileLookup::Ready(image) => {
                    self.draw_tile(surface, &geometry, config, coord, &image);
                    report.drawn += 1;
                }
                TileLookup::Deferred => report.pending += 1,
                TileLookup::Unavailable => report.unavailable += 1,
            }
        }

        self.draw_overlays(surface, &geometry, config, lines);
        report.markers = self.place_markers(&geometry, elements);
        report.coordinates = config
            .show_coordinates
            .then(|| camera.coordinate_readout());

        log::debug!(
            "frame z{}: {} requested, {} drawn, {} pending",
            report.zoom,
            report.requested,
            report.drawn,
            report.pending
        );
        report
    }

    /// Paints a late tile at the camera's current geometry
    pub fn paint_tile(
        &self,
        surface: &mut dyn Surface,
        camera: &Camera,
        config: &MapConfig,
        coord: TileCoord,
        image: &Arc<TileImage>,
    ) {
        let geometry = self.geometry(camera);
        self.draw_tile(surface, &geometry, config, coord, image);
    }

    fn draw_tile(
        &self,
        surface: &mut dyn Surface,
        geometry: &FrameGeometry,
        config: &MapConfig,
        coord: TileCoord,
        image: &TileImage,
    ) {
        let rect = geometry.tile_rect(coord);
        surface.draw_image(image, rect);
        if config.show_tile_borders {
            surface.stroke_rect(rect, Color::TILE_BORDER, TILE_BORDER_WIDTH);
        }
    }

    /// Strokes every line segment by segment, then the center mark
    pub fn draw_overlays(
        &self,
        surface: &mut dyn Surface,
        geometry: &FrameGeometry,
        config: &MapConfig,
        lines: &[MapLine],
    ) {
        for line in lines {
            let color = line.color.unwrap_or(Color::BLACK);
            let points: Vec<Point> = line
                .coordinates
                .iter()
                .map(|lat_lng| geometry.world_to_screen(*lat_lng))
                .collect();
            for segment in points.windows(2) {
                surface.stroke_line(segment[0], segment[1], color, LINE_WIDTH);
            }
        }

        if config.show_center {
            let center = geometry.canvas.center();
            let half = CENTER_MARK_SIZE / 2.0;
            surface.fill_rect(
                Rect::new(center.x - half, center.y - half, CENTER_MARK_SIZE, CENTER_MARK_SIZE),
                Color::RED,
            );
        }
    }

    /// Positions markers, dropping those outside the canvas
    pub fn place_markers<P>(
        &self,
        geometry: &FrameGeometry,
        elements: &[MapElement<P>],
    ) -> Vec<MarkerPlacement> {
        let bounds = geometry.canvas.rect();
        elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| {
                let position = geometry.world_to_screen(element.lat_lng);
                bounds
                    .contains(&position)
                    .then_some(MarkerPlacement { index, position })
            })
            .collect()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&MapConfig::default())
    }
}
