// src/geo/projection.rs

//! Forward transformation from a raster's native SRS to lon/lat degrees.
//!
//! The SRS arrives as a PROJ.4 string (as reported by `gdalinfo -proj4`).
//! Geographic sources and spherical Web Mercator are handled with inline
//! math; everything else goes through `proj4rs`.

use std::f64::consts::PI;
use std::fmt;

use anyhow::{Result, anyhow};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

/// Target SRS for all transformations.
pub const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

const HALF_EARTH: f64 = 20_037_508.342_789_244;

/// Converts native raster coordinates to `(lon, lat)` in degrees.
pub trait Projector: fmt::Debug {
    fn to_lon_lat(&self, x: f64, y: f64) -> Result<(f64, f64)>;
}

/// Pick the cheapest projector able to handle `proj4`.
pub fn build_projector(proj4: &str) -> Result<Box<dyn Projector>> {
    let params = Proj4Params::parse(proj4);

    match params.get("proj") {
        None => Err(anyhow!("PROJ.4 string has no +proj parameter: '{proj4}'")),
        Some("longlat") | Some("latlong") | Some("lonlat") | Some("latlon") => {
            Ok(Box::new(Geographic))
        }
        Some("merc") if params.is_spherical_web_mercator() => Ok(Box::new(WebMercator)),
        Some(_) => Ok(Box::new(Proj4Projector::new(proj4)?)),
    }
}

/// Source coordinates are already lon/lat degrees.
///
/// Datum differences between geographic systems are far below tile size and
/// are ignored.
#[derive(Debug, Clone, Copy)]
pub struct Geographic;

impl Projector for Geographic {
    fn to_lon_lat(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok((x, y))
    }
}

/// EPSG:3857 inverse, no library needed.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator;

impl Projector for WebMercator {
    fn to_lon_lat(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let lon = x / HALF_EARTH * 180.0;
        let y_rad = y * PI / HALF_EARTH;
        let lat = (2.0 * y_rad.exp().atan() - PI / 2.0).to_degrees();
        Ok((lon, lat))
    }
}

/// Generic projected SRS through `proj4rs`.
pub struct Proj4Projector {
    source: Proj,
    target: Proj,
    definition: String,
}

impl fmt::Debug for Proj4Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proj4Projector")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl Proj4Projector {
    pub fn new(proj4: &str) -> Result<Self> {
        let source = Proj::from_proj_string(proj4)
            .map_err(|e| anyhow!("invalid source projection '{proj4}': {e:?}"))?;
        let target = Proj::from_proj_string(WGS84_PROJ4)
            .map_err(|e| anyhow!("invalid target projection: {e:?}"))?;
        Ok(Self {
            source,
            target,
            definition: proj4.to_string(),
        })
    }
}

impl Projector for Proj4Projector {
    fn to_lon_lat(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut point = (x, y, 0.0);
        transform(&self.source, &self.target, &mut point)
            .map_err(|e| anyhow!("transform of ({x}, {y}) failed: {e:?}"))?;

        // proj4rs yields geographic output in radians.
        let (lon, lat) = (point.0.to_degrees(), point.1.to_degrees());
        if !lon.is_finite() || !lat.is_finite() {
            return Err(anyhow!("transform of ({x}, {y}) produced a non-finite result"));
        }
        Ok((lon, lat))
    }
}

/// Minimal `+key=value` view over a PROJ.4 string.
struct Proj4Params<'a> {
    pairs: Vec<(&'a str, Option<&'a str>)>,
}

impl<'a> Proj4Params<'a> {
    fn parse(s: &'a str) -> Self {
        let pairs = s
            .split_whitespace()
            .filter_map(|tok| tok.strip_prefix('+'))
            .map(|tok| match tok.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (tok, None),
            })
            .collect();
        Self { pairs }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| *v)
    }

    fn is_spherical_web_mercator(&self) -> bool {
        let sphere = self.get("a") == Some("6378137") && self.get("b") == Some("6378137");
        let centered = ["lon_0", "x_0", "y_0"]
            .iter()
            .all(|k| self.get(k).is_none_or(|v| v == "0" || v == "0.0"));
        sphere && centered
    }
}
