//! Drawing surfaces the renderer composites onto.
//!
//! [`Surface`] is the narrow 2D interface the renderer needs. Two
//! implementations ship with the crate: [`RecordingSurface`] keeps a command
//! log (hosts can replay it onto their own canvas), and [`RasterSurface`]
//! composites into an in-memory RGBA image with `imageproc` primitives.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, Blend,
};
use imageproc::rect::Rect as PixelRect;
use serde::{Deserialize, Serialize};

use crate::core::geo::{Point, Rect, Size};
use crate::tiles::loader::TileImage;
use crate::{MapError, Result};

/// 8-bit RGBA color, written as `#RRGGBB` or `#RRGGBBAA`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(0xff, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Translucent black used for tile border outlines
    pub const TILE_BORDER: Color = Color::rgba(0, 0, 0, 0x88);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xff)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| MapError::Config(format!("invalid color '{hex}'")))
        };
        match digits.len() {
            6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(MapError::Config(format!("invalid color '{hex}'"))),
        }
    }

    fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// The 2D operations the renderer issues per frame
pub trait Surface {
    /// Resizes the backing store; contents are discarded
    fn resize(&mut self, size: Size);

    fn size(&self) -> Size;

    /// Makes `rect` fully transparent
    fn clear(&mut self, rect: Rect);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws `image` scaled into `dest`
    fn draw_image(&mut self, image: &TileImage, dest: Rect);

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64);

    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f64);
}

/// One recorded call on a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize(Size),
    Clear(Rect),
    FillRect { rect: Rect, color: Color },
    DrawImage { dest: Rect, natural: Size },
    StrokeRect { rect: Rect, color: Color, width: f64 },
    StrokeLine { from: Point, to: Point, color: Color, width: f64 },
}

/// A surface that only records what was drawn
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Destination rects of every drawn image, in draw order
    pub fn image_rects(&self) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::DrawImage { dest, .. } => Some(*dest),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<(Point, Point, Color)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::StrokeLine { from, to, color, .. } => Some((*from, *to, *color)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, size: Size) {
        self.size = size;
        self.commands.push(DrawCommand::Resize(size));
    }

    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::Clear(rect));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_image(&mut self, image: &TileImage, dest: Rect) {
        self.commands.push(DrawCommand::DrawImage {
            dest,
            natural: Size::new(image.width(), image.height()),
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.commands.push(DrawCommand::StrokeRect { rect, color, width });
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f64) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            color,
            width,
        });
    }
}

/// A surface backed by an RGBA image. Images are scaled nearest-neighbour,
/// colors are blended source-over.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(size: Size) -> Self {
        Self {
            pixels: RgbaImage::new(size.width, size.height),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| {
            let [r, g, b, a] = self.pixels.get_pixel(x, y).0;
            Color::rgba(r, g, b, a)
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.pixels.save(path)?;
        Ok(())
    }

    /// Runs `draw` against a canvas that blends instead of overwriting
    fn blended(&mut self, draw: impl FnOnce(&mut Blend<RgbaImage>)) {
        let mut canvas = Blend(std::mem::replace(&mut self.pixels, RgbaImage::new(0, 0)));
        draw(&mut canvas);
        self.pixels = canvas.0;
    }
}

/// Whole-pixel rect covering `rect`, `None` when it rounds to nothing
fn pixel_rect(rect: Rect) -> Option<PixelRect> {
    let x = rect.x.round();
    let y = rect.y.round();
    let width = rect.right().round() - x;
    let height = rect.bottom().round() - y;
    (width >= 1.0 && height >= 1.0)
        .then(|| PixelRect::at(x as i32, y as i32).of_size(width as u32, height as u32))
}

impl Surface for RasterSurface {
    fn resize(&mut self, size: Size) {
        self.pixels = RgbaImage::new(size.width, size.height);
    }

    fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    fn clear(&mut self, rect: Rect) {
        if let Some(rect) = pixel_rect(rect) {
            draw_filled_rect_mut(&mut self.pixels, rect, Color::TRANSPARENT.to_rgba());
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if let Some(rect) = pixel_rect(rect) {
            self.blended(|canvas| draw_filled_rect_mut(canvas, rect, color.to_rgba()));
        }
    }

    fn draw_image(&mut self, image: &TileImage, dest: Rect) {
        let Some(rect) = pixel_rect(dest) else {
            return;
        };
        let source = image.pixels();
        let (x, y) = (rect.left() as i64, rect.top() as i64);
        if (rect.width(), rect.height()) == (source.width(), source.height()) {
            imageops::overlay(&mut self.pixels, source, x, y);
        } else {
            let scaled = imageops::resize(source, rect.width(), rect.height(), FilterType::Nearest);
            imageops::overlay(&mut self.pixels, &scaled, x, y);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        let Some(outer) = pixel_rect(rect) else {
            return;
        };
        let rings = width.round().max(1.0) as u32;
        self.blended(|canvas| {
            for inset in 0..rings {
                if outer.width() <= 2 * inset || outer.height() <= 2 * inset {
                    break;
                }
                let ring = PixelRect::at(outer.left() + inset as i32, outer.top() + inset as i32)
                    .of_size(outer.width() - 2 * inset, outer.height() - 2 * inset);
                draw_hollow_rect_mut(canvas, ring, color.to_rgba());
            }
        });
    }

    /// Thick lines are drawn as parallel one-pixel segments
    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f64) {
        let delta = to.subtract(&from);
        let length = delta.x.hypot(delta.y);
        let normal = if length > f64::EPSILON {
            Point::new(-delta.y / length, delta.x / length)
        } else {
            Point::new(0.0, 1.0)
        };
        let strands = width.round().max(1.0) as u32;
        self.blended(|canvas| {
            for strand in 0..strands {
                let offset = normal.multiply(strand as f64 - (strands - 1) as f64 / 2.0);
                let (start, end) = (from.add(&offset), to.add(&offset));
                draw_line_segment_mut(
                    canvas,
                    (start.x as f32, start.y as f32),
                    (end.x as f32, end.y as f32),
                    color.to_rgba(),
                );
            }
        });
    }
}
