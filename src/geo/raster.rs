// src/geo/raster.rs

//! Raster metadata lookup.
//!
//! Metadata comes from GDAL's own tools (`gdalinfo -json -proj4`,
//! `gdalsrsinfo -o proj4`) run as subprocesses, so no GDAL bindings are
//! linked. The [`RasterProbe`] trait lets tests supply metadata directly.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::debug;

/// GDAL affine geotransform:
/// `X = gt[0] + px*gt[1] + py*gt[2]`, `Y = gt[3] + px*gt[4] + py*gt[5]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform with square pixels of `pixel_size` units.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self([origin_x, pixel_size, 0.0, origin_y, 0.0, -pixel_size])
    }

    pub fn apply(&self, px: f64, py: f64) -> (f64, f64) {
        let gt = &self.0;
        (
            gt[0] + px * gt[1] + py * gt[2],
            gt[3] + px * gt[4] + py * gt[5],
        )
    }

    /// Native coordinates of the four outer pixel corners.
    pub fn corners(&self, width: u64, height: u64) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ]
    }
}

/// What the estimator needs to know about a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: u64,
    pub height: u64,
    pub geo_transform: Option<GeoTransform>,
    /// Spatial reference as a PROJ.4 string; `None` when the raster has none.
    pub proj4: Option<String>,
}

/// Source of raster metadata.
pub trait RasterProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<RasterInfo>;

    /// Turn a user-supplied SRS (e.g. `EPSG:4490`) into a PROJ.4 string.
    fn resolve_srs(&self, srs: &str) -> Result<String>;
}

/// Probe backed by the `gdalinfo` and `gdalsrsinfo` executables.
#[derive(Debug, Clone)]
pub struct GdalInfoProbe {
    gdalinfo: String,
    gdalsrsinfo: String,
}

impl Default for GdalInfoProbe {
    fn default() -> Self {
        Self::new("gdalinfo", "gdalsrsinfo")
    }
}

impl GdalInfoProbe {
    pub fn new(gdalinfo: impl Into<String>, gdalsrsinfo: impl Into<String>) -> Self {
        Self {
            gdalinfo: gdalinfo.into(),
            gdalsrsinfo: gdalsrsinfo.into(),
        }
    }
}

impl RasterProbe for GdalInfoProbe {
    fn probe(&self, path: &Path) -> Result<RasterInfo> {
        debug!(program = %self.gdalinfo, path = %path.display(), "probing raster");
        let stdout = run_capture(
            Command::new(&self.gdalinfo)
                .arg("-json")
                .arg("-proj4")
                .arg(path),
        )?;
        parse_gdalinfo_json(&stdout)
    }

    fn resolve_srs(&self, srs: &str) -> Result<String> {
        let srs = srs.trim();
        if srs.starts_with('+') {
            return Ok(srs.to_string());
        }

        debug!(program = %self.gdalsrsinfo, srs, "resolving SRS");
        let stdout = run_capture(Command::new(&self.gdalsrsinfo).args(["-o", "proj4", srs]))?;
        let proj4 = stdout
            .lines()
            .map(|l| l.trim().trim_matches('\''))
            .find(|l| l.starts_with('+'))
            .ok_or_else(|| anyhow!("gdalsrsinfo printed no PROJ.4 definition for '{srs}'"))?;
        Ok(proj4.to_string())
    }
}

fn run_capture(cmd: &mut Command) -> Result<String> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("running '{program}'"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "'{program}' exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8(output.stdout).with_context(|| format!("decoding output of '{program}'"))
}

#[derive(Deserialize)]
struct GdalInfoJson {
    size: [u64; 2],
    #[serde(rename = "geoTransform")]
    geo_transform: Option<[f64; 6]>,
    #[serde(rename = "coordinateSystem")]
    coordinate_system: Option<CoordinateSystemJson>,
}

#[derive(Deserialize)]
struct CoordinateSystemJson {
    #[serde(default)]
    wkt: String,
    proj4: Option<String>,
}

/// Parse the output of `gdalinfo -json -proj4`.
pub fn parse_gdalinfo_json(json: &str) -> Result<RasterInfo> {
    let info: GdalInfoJson = serde_json::from_str(json).context("parsing gdalinfo JSON")?;

    let proj4 = info
        .coordinate_system
        .filter(|cs| !cs.wkt.trim().is_empty())
        .and_then(|cs| cs.proj4)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    Ok(RasterInfo {
        width: info.size[0],
        height: info.size[1],
        geo_transform: info.geo_transform.map(GeoTransform),
        proj4,
    })
}
