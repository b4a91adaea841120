use serde::{Deserialize, Serialize};

use crate::core::constants::{
    COORDINATE_PRECISION, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_DIVISOR,
};
use crate::core::geo::{LatLng, Point};
use crate::core::projection::{lat_lng_to_tile, sub_tile_offset};

/// The authoritative view state of a map widget
///
/// `zoom` is the integer level whose tiles are fetched. `fractional_zoom` is
/// the continuous value used to scale those tiles while a wheel gesture is in
/// flight; once the gesture commits, `fractional_zoom - zoom` lies in `[0, 1)`.
///
/// Every mutation leaves the center inside `[-85, 85] x [-180, 180]`: moves
/// past the edge saturate, they are never rejected and never wrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    center: LatLng,
    zoom: u8,
    fractional_zoom: f64,
    /// Degrees per dragged pixel; `None` means `1 / 2^zoom`
    pan_scale: Option<f64>,
}

/// Running wheel state for one zoom gesture, owned by the input controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelAccumulator {
    /// Fractional zoom when the gesture began
    pub origin_zoom: f64,
    /// Sum of accepted wheel deltas since the gesture began
    pub accumulated: f64,
    /// Wheel delta units per zoom level
    pub divisor: f64,
}

impl WheelAccumulator {
    pub fn new(divisor: f64) -> Self {
        Self {
            origin_zoom: 0.0,
            accumulated: 0.0,
            divisor,
        }
    }

    /// Starts a new gesture anchored at `origin_zoom`
    pub fn begin(&mut self, origin_zoom: f64) {
        self.origin_zoom = origin_zoom;
        self.accumulated = 0.0;
    }

    /// Fractional zoom implied by adding `delta` to the running sum
    pub fn zoom_after(&self, delta: f64) -> f64 {
        self.origin_zoom - (self.accumulated + delta) / self.divisor
    }
}

impl Default for WheelAccumulator {
    fn default() -> Self {
        Self::new(WHEEL_ZOOM_DIVISOR)
    }
}

impl Camera {
    /// Creates a camera, saturating the center and zoom into range. A
    /// non-finite coordinate is replaced by 0.
    pub fn new(center: LatLng, zoom: u8) -> Self {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let finite = |value: f64| if value.is_finite() { value } else { 0.0 };
        if !center.lat.is_finite() || !center.lng.is_finite() {
            log::warn!("non-finite camera center {center:?}, using 0 for the bad axis");
        }
        Self {
            center: LatLng::new(finite(center.lat), finite(center.lng)).clamped(),
            zoom,
            fractional_zoom: zoom as f64,
            pan_scale: None,
        }
    }

    /// Uses a fixed degrees-per-pixel pan coefficient instead of `1 / 2^zoom`
    pub fn with_pan_scale(mut self, pan_scale: Option<f64>) -> Self {
        self.pan_scale = pan_scale;
        self
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn latitude(&self) -> f64 {
        self.center.lat
    }

    pub fn longitude(&self) -> f64 {
        self.center.lng
    }

    /// Committed integer zoom (the level tiles are fetched at)
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn fractional_zoom(&self) -> f64 {
        self.fractional_zoom
    }

    /// Degrees moved per dragged pixel at the committed zoom
    pub fn pan_coefficient(&self) -> f64 {
        self.pan_scale
            .unwrap_or_else(|| 1.0 / 2_f64.powi(self.zoom as i32))
    }

    /// Moves the center by a pixel delta. Dragging right moves west, dragging
    /// down moves north; both axes saturate at the camera bounds. Non-finite
    /// deltas are ignored.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            log::debug!("ignoring non-finite pan ({dx}, {dy})");
            return;
        }
        let coefficient = self.pan_coefficient();
        self.center = LatLng::new(
            LatLng::clamp_lat(self.center.lat + dy * coefficient),
            LatLng::clamp_lng(self.center.lng - dx * coefficient),
        );
    }

    /// Applies a wheel delta to the running gesture.
    ///
    /// Returns the integer zoom the gesture now points at, which the caller
    /// debounces before committing. If the delta is not finite or the level
    /// falls outside `[0, 18]` the event is dropped: neither the camera nor the
    /// accumulator changes.
    pub fn zoom_by(&mut self, wheel: &mut WheelAccumulator, delta: f64) -> Option<u8> {
        if !delta.is_finite() {
            log::debug!("ignoring non-finite wheel delta {delta}");
            return None;
        }
        let fractional_zoom = wheel.zoom_after(delta);
        let integer_zoom = fractional_zoom.floor();
        if integer_zoom < MIN_ZOOM as f64 || integer_zoom > MAX_ZOOM as f64 {
            log::debug!("wheel zoom {fractional_zoom:.3} out of range, ignoring");
            return None;
        }

        wheel.accumulated += delta;
        self.fractional_zoom = fractional_zoom;
        Some(integer_zoom as u8)
    }

    /// Commits a debounced integer zoom. Out-of-range levels are ignored and
    /// leave the previous zoom in place. Returns whether the level changed.
    pub fn commit_zoom(&mut self, zoom: u8) -> bool {
        if zoom > MAX_ZOOM {
            log::warn!("ignoring zoom commit to {zoom}");
            return false;
        }
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        // Keep the tile scale within one level of the fetched tiles
        if self.fractional_zoom < zoom as f64 || self.fractional_zoom >= zoom as f64 + 1.0 {
            self.fractional_zoom = zoom as f64;
        }
        changed
    }

    /// Jumps straight to `zoom` with no gesture or debounce
    pub fn set_zoom_immediate(&mut self, zoom: u8) -> bool {
        if zoom > MAX_ZOOM {
            return false;
        }
        self.zoom = zoom;
        self.fractional_zoom = zoom as f64;
        true
    }

    /// Scale applied to the fetched tiles, `2^(fractional_zoom - zoom)`
    pub fn scale_factor(&self) -> f64 {
        2_f64.powf(self.fractional_zoom - self.zoom as f64)
    }

    /// Fractional tile position of the center at the committed zoom
    pub fn tile_position(&self) -> Point {
        lat_lng_to_tile(self.center, self.zoom as f64)
    }

    /// Pixel offset of the center inside its tile
    pub fn sub_tile_offset(&self) -> Point {
        sub_tile_offset(self.tile_position())
    }

    /// `"lat, lng, zoom"` with coordinates rounded to nine decimal places
    pub fn coordinate_readout(&self) -> String {
        let round = |value: f64| (value * COORDINATE_PRECISION).round() / COORDINATE_PRECISION;
        format!(
            "{}, {}, {}",
            round(self.center.lat),
            round(self.center.lng),
            self.zoom
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        use crate::core::constants::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_ZOOM};
        Self::new(LatLng::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE), DEFAULT_ZOOM)
    }
}
