//! Spherical Web Mercator projection between geographic coordinates and
//! fractional slippy-map tile coordinates.
//!
//! `floor()` of a projected point is the containing tile index; the fractional
//! remainder times [`TILE_SIZE`] is the pixel offset inside that tile.
//!
//! Neither function clamps its input. The latitude diverges at the poles, so
//! callers must pass latitudes already saturated to `[-85, 85]` (the camera
//! guarantees this for its own center).

use std::f64::consts::PI;

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLng, Point};

/// Projects `lat_lng` to fractional tile coordinates at `zoom`
pub fn lat_lng_to_tile(lat_lng: LatLng, zoom: f64) -> Point {
    let lat_rad = lat_lng.lat.to_radians();
    let n = 2_f64.powf(zoom);
    let y_rad = (lat_rad.tan() + 1.0 / lat_rad.cos()).ln();

    let x = (0.5 + lat_lng.lng / 360.0) * n;
    let y = n * (1.0 - y_rad / PI) / 2.0;
    Point::new(x, y)
}

/// Inverse of [`lat_lng_to_tile`]
pub fn tile_to_lat_lng(tile: Point, zoom: f64) -> LatLng {
    let n = 2_f64.powf(zoom);
    let lng = tile.x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * tile.y / n)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Pixel offset of a projected point inside its containing tile
pub fn sub_tile_offset(tile: Point) -> Point {
    tile.fract().multiply(TILE_SIZE as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_origin_projects_to_grid_center() {
        for zoom in 0..=18 {
            let tile = lat_lng_to_tile(LatLng::new(0.0, 0.0), zoom as f64);
            let half = 2_f64.powi(zoom) / 2.0;
            assert!(close(tile.x, half));
            assert!(close(tile.y, half));
        }
    }

    #[test]
    fn test_known_tile_for_vancouver() {
        let tile = lat_lng_to_tile(LatLng::new(49.2827, -123.1207), 12.0);
        assert_eq!(tile.floor(), Point::new(647.0, 1401.0));
        assert!((tile.x - 647.160_035_555).abs() < 1e-6);
        assert!((tile.y - 1401.740_235_420).abs() < 1e-6);

        let offset = sub_tile_offset(tile);
        assert!((offset.x - 0.160_035_555 * 256.0).abs() < 1e-4);
    }

    #[test]
    fn test_projection_stays_inside_grid() {
        for zoom in [0_u8, 1, 5, 12, 18] {
            let n = 2_f64.powi(zoom as i32);
            let mut lat = -85.0;
            while lat <= 85.0 {
                let mut lng = -180.0;
                while lng <= 180.0 {
                    let tile = lat_lng_to_tile(LatLng::new(lat, lng), zoom as f64);
                    assert!(tile.x >= 0.0 && tile.x <= n, "x {} at {lat},{lng},{zoom}", tile.x);
                    assert!(tile.y >= 0.0 && tile.y <= n, "y {} at {lat},{lng},{zoom}", tile.y);
                    lng += 7.5;
                }
                lat += 2.5;
            }
        }
    }

    #[test]
    fn test_round_trip() {
        let sydney = LatLng::new(-33.8688, 151.2093);
        let back = tile_to_lat_lng(lat_lng_to_tile(sydney, 14.0), 14.0);
        assert!((back.lat - sydney.lat).abs() < 1e-9);
        assert!((back.lng - sydney.lng).abs() < 1e-9);
    }

    #[test]
    fn test_extremes_at_camera_limits() {
        let north_east = lat_lng_to_tile(LatLng::new(85.0, 180.0), 3.0);
        assert!(close(north_east.x, 8.0));
        assert!(north_east.y > 0.0 && north_east.y < 0.02);

        let south_west = lat_lng_to_tile(LatLng::new(-85.0, -180.0), 3.0);
        assert!(close(south_west.x, 0.0));
        assert!(south_west.y > 7.98 && south_west.y < 8.0);
    }
}
