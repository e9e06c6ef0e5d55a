// src/geo/mod.rs

//! Geographic helpers for tile estimation.
//!
//! - [`tile`] maps lon/lat to XYZ tile indices (spherical Web Mercator).
//! - [`bbox`] holds the geographic bounding box and counts the tiles it covers.
//! - [`raster`] reads raster metadata (size, geotransform, SRS) through GDAL's
//!   command line tools.
//! - [`projection`] transforms native raster coordinates to lon/lat.

pub mod bbox;
pub mod projection;
pub mod raster;
pub mod tile;

pub use bbox::BoundingBox;
pub use projection::{Projector, build_projector};
pub use raster::{GdalInfoProbe, GeoTransform, RasterInfo, RasterProbe};
pub use tile::{MAX_LAT, MIN_LAT, TileIndex, tile_index_of};
