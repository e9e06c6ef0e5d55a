// src/geo/bbox.rs

use super::tile::{TileIndex, clamp_lat, normalize_lon, tile_index_of};

/// Axis-aligned geographic box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Build a box from two opposite corners in any order.
    pub fn new(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> Self {
        Self::enclosing(&[(lon_a, lat_a), (lon_b, lat_b)])
            .unwrap_or_else(Self::whole_world)
    }

    /// Smallest box enclosing all `(lon, lat)` points, or `None` when empty.
    ///
    /// Longitudes are wrapped and latitudes clamped to the Mercator range
    /// before the envelope is taken.
    pub fn enclosing(points: &[(f64, f64)]) -> Option<Self> {
        let mut iter = points
            .iter()
            .map(|&(lon, lat)| (normalize_lon(lon), clamp_lat(lat)));
        let (lon0, lat0) = iter.next()?;

        let init = Self {
            min_lon: lon0,
            max_lon: lon0,
            min_lat: lat0,
            max_lat: lat0,
        };

        Some(iter.fold(init, |b, (lon, lat)| Self {
            min_lon: b.min_lon.min(lon),
            max_lon: b.max_lon.max(lon),
            min_lat: b.min_lat.min(lat),
            max_lat: b.max_lat.max(lat),
        }))
    }

    pub fn whole_world() -> Self {
        Self {
            min_lon: -180.0,
            max_lon: 180.0,
            min_lat: super::MIN_LAT,
            max_lat: super::MAX_LAT,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Tile-index envelope `(north_west, south_east)` at zoom `z`.
    pub fn tile_envelope(&self, z: u8) -> (TileIndex, TileIndex) {
        let a = tile_index_of(self.min_lon, self.max_lat, z);
        let b = tile_index_of(self.max_lon, self.min_lat, z);

        let nw = TileIndex {
            z,
            x: a.x.min(b.x),
            y: a.y.min(b.y),
        };
        let se = TileIndex {
            z,
            x: a.x.max(b.x),
            y: a.y.max(b.y),
        };
        (nw, se)
    }

    /// Number of tiles in the rectangular tile envelope at zoom `z`.
    ///
    /// This over-counts for rotated or non-rectangular footprints; the backend
    /// decides which of these tiles it actually writes.
    pub fn tile_count(&self, z: u8) -> u64 {
        let (nw, se) = self.tile_envelope(z);
        let cols = (i64::from(se.x) - i64::from(nw.x) + 1).max(0) as u64;
        let rows = (i64::from(se.y) - i64::from(nw.y) + 1).max(0) as u64;
        cols * rows
    }
}
