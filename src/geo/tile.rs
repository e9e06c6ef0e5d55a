// src/geo/tile.rs

use std::f64::consts::PI;
use std::fmt;

/// Northern limit of spherical Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;
/// Southern limit of spherical Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// XYZ tile index: `(0, 0)` is the north-west tile at every zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Wrap a longitude into `[-180, 180]`.
///
/// Values already inside the interval are returned unchanged, so `180.0`
/// stays on the east edge instead of folding onto `-180.0`.
pub fn normalize_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(MIN_LAT, MAX_LAT)
}

/// Tile containing the given point at zoom `z`.
///
/// Out-of-range latitudes are clamped to the Mercator limits and the result
/// is clamped into the `2^z x 2^z` grid, so this never fails.
pub fn tile_index_of(lon: f64, lat: f64, z: u8) -> TileIndex {
    let n = 1_i64 << z;
    let lon = normalize_lon(lon);
    let lat_rad = clamp_lat(lat).to_radians();

    let fx = (lon + 180.0) / 360.0 * n as f64;
    let fy = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n as f64;

    TileIndex {
        z,
        x: clamp_axis(fx, n),
        y: clamp_axis(fy, n),
    }
}

fn clamp_axis(v: f64, n: i64) -> u32 {
    // NaN saturates to 0 in the cast.
    (v.floor() as i64).clamp(0, n - 1) as u32
}
