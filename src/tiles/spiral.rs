//! Center-outward ordering of the tile cells covering a viewport.
//!
//! Cells come out of a square spiral walked from `(0, 0)` and are filtered to
//! the half-open rectangle `(-w/2, w/2] x (-h/2, h/2]`, so the tile under the
//! camera is requested first and rings further out follow.

use serde::{Deserialize, Serialize};

/// Integer offset from the tile under the camera center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportCell {
    pub dx: i64,
    pub dy: i64,
}

impl ViewportCell {
    pub fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }

    /// Ring index of the cell (Chebyshev distance from the center)
    pub fn ring(&self) -> i64 {
        self.dx.abs().max(self.dy.abs())
    }
}

/// Lazy spiral walk over a `width` x `height` cell rectangle
#[derive(Debug, Clone)]
pub struct Spiral {
    width: i64,
    height: i64,
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
    direction_switch: bool,
    emitted: i64,
    steps: i64,
    max_steps: i64,
}

impl Spiral {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as i64;
        let height = height as i64;
        let side = width.max(height) + 2;
        Self {
            width,
            height,
            x: 0,
            y: 0,
            dx: 0,
            dy: -1,
            direction_switch: true,
            emitted: 0,
            steps: 0,
            max_steps: side * side * 4,
        }
    }

    /// Number of cells the walk yields
    pub fn cell_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    fn in_rect(&self) -> bool {
        // 2x > -w && 2x <= w keeps the comparison exact for odd widths
        2 * self.x > -self.width
            && 2 * self.x <= self.width
            && 2 * self.y > -self.height
            && 2 * self.y <= self.height
    }

    fn advance(&mut self) {
        let (x, y) = (self.x, self.y);
        if (self.direction_switch && x == y) || (x < 0 && x == -y) || (x > 0 && x == 1 - y) {
            let (dx, dy) = (-self.dy, self.dx);
            self.dx = dx;
            self.dy = dy;
            self.direction_switch = x != y || dx == -1;
        }
        self.x += self.dx;
        self.y += self.dy;
        self.steps += 1;
    }
}

impl Iterator for Spiral {
    type Item = ViewportCell;

    fn next(&mut self) -> Option<Self::Item> {
        while self.emitted < self.width * self.height && self.steps < self.max_steps {
            let cell = self.in_rect().then(|| ViewportCell::new(self.x, self.y));
            self.advance();
            if let Some(cell) = cell {
                self.emitted += 1;
                return Some(cell);
            }
        }
        None
    }
}

/// Collects the full spiral for a `width` x `height` rectangle
pub fn spiral(width: u32, height: u32) -> Vec<ViewportCell> {
    Spiral::new(width, height).collect()
}

/// Tiles needed to cover `pixels` plus the prefetch buffer
pub fn coverage(pixels: u32, tile_size: u32, buffer: u32) -> u32 {
    pixels.div_ceil(tile_size).saturating_add(buffer)
}
