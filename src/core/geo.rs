use serde::{Deserialize, Serialize};

use crate::core::constants::{MAX_LATITUDE, MAX_LONGITUDE, MAX_ZOOM};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the coordinate lies inside the camera's allowed box
    pub fn is_within_camera_bounds(&self) -> bool {
        (-MAX_LATITUDE..=MAX_LATITUDE).contains(&self.lat)
            && (-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&self.lng)
    }

    /// Saturates latitude at the camera limit
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Saturates longitude at the antimeridian
    pub fn clamp_lng(lng: f64) -> f64 {
        lng.clamp(-MAX_LONGITUDE, MAX_LONGITUDE)
    }

    /// Returns the coordinate clamped into the camera's allowed box
    pub fn clamped(&self) -> Self {
        Self::new(Self::clamp_lat(self.lat), Self::clamp_lng(self.lng))
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    /// Fractional part on both axes
    pub fn fract(&self) -> Point {
        self.subtract(&self.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Pixel dimensions of a canvas or container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum, used to enforce a minimum canvas size
    pub fn at_least(&self, minimum: Size) -> Size {
        Size::new(self.width.max(minimum.width), self.height.max(minimum.height))
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// Axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive containment test
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Builds a coordinate from signed indices, rejecting anything outside the
    /// `2^z` grid (negative indices show up at the projection edges)
    pub fn checked(x: i64, y: i64, z: u8) -> Option<Self> {
        if z > MAX_ZOOM {
            return None;
        }
        let max_coord = 1_i64 << z;
        if x < 0 || y < 0 || x >= max_coord || y >= max_coord {
            return None;
        }
        Some(Self::new(x as u32, y as u32, z))
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        Self::checked(self.x as i64, self.y as i64, self.z).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_clamping() {
        let coord = LatLng::new(89.0, -200.0).clamped();
        assert_eq!(coord.lat, 85.0);
        assert_eq!(coord.lng, -180.0);
        assert!(coord.is_within_camera_bounds());
        assert!(!LatLng::new(86.0, 0.0).is_within_camera_bounds());
    }

    #[test]
    fn test_checked_tile_coord() {
        assert_eq!(TileCoord::checked(3, 4, 3), Some(TileCoord::new(3, 4, 3)));
        assert_eq!(TileCoord::checked(-1, 0, 3), None);
        assert_eq!(TileCoord::checked(0, -1, 3), None);
        assert_eq!(TileCoord::checked(8, 0, 3), None);
        assert_eq!(TileCoord::checked(0, 0, 19), None);
        assert_eq!(TileCoord::checked(0, 0, 0), Some(TileCoord::new(0, 0, 0)));
        assert!(!TileCoord::new(1, 0, 0).is_valid());
    }

    #[test]
    fn test_size_minimum() {
        let size = Size::new(640, 900).at_least(Size::new(800, 600));
        assert_eq!(size, Size::new(800, 900));
        assert_eq!(size.center(), Point::new(400.0, 450.0));
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(0.0, 0.0, 800.0, 600.0);
        assert!(rect.contains(&Point::new(0.0, 0.0)));
        assert!(rect.contains(&Point::new(800.0, 600.0)));
        assert!(!rect.contains(&Point::new(-0.5, 10.0)));
        assert!(!rect.contains(&Point::new(10.0, 600.5)));
    }
}
