use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use tilerun::geo::{GeoTransform, RasterInfo, RasterProbe};

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Raster probe answering from canned metadata.
#[derive(Debug)]
pub struct FakeRasterProbe {
    info: std::result::Result<RasterInfo, String>,
    srs: HashMap<String, String>,
    probed: Mutex<Vec<PathBuf>>,
}

impl FakeRasterProbe {
    pub fn with_info(info: RasterInfo) -> Self {
        Self {
            info: Ok(info),
            srs: HashMap::new(),
            probed: Mutex::new(Vec::new()),
        }
    }

    /// North-up WGS84 raster covering the given box at 1000x1000 pixels.
    pub fn geographic(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        let (width, height) = (1000, 1000);
        let gt = GeoTransform([
            min_lon,
            (max_lon - min_lon) / width as f64,
            0.0,
            max_lat,
            0.0,
            -(max_lat - min_lat) / height as f64,
        ]);
        Self::with_info(RasterInfo {
            width,
            height,
            geo_transform: Some(gt),
            proj4: Some(WGS84.to_string()),
        })
    }

    /// Probe whose every call fails.
    pub fn failing(reason: &str) -> Self {
        Self {
            info: Err(reason.to_string()),
            srs: HashMap::new(),
            probed: Mutex::new(Vec::new()),
        }
    }

    /// Map a user SRS name to the PROJ.4 string `resolve_srs` returns.
    pub fn with_srs(mut self, name: &str, proj4: &str) -> Self {
        self.srs.insert(name.to_string(), proj4.to_string());
        self
    }

    pub fn probed(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

impl RasterProbe for FakeRasterProbe {
    fn probe(&self, path: &Path) -> Result<RasterInfo> {
        self.probed.lock().unwrap().push(path.to_path_buf());
        self.info.clone().map_err(|reason| anyhow!(reason))
    }

    fn resolve_srs(&self, srs: &str) -> Result<String> {
        if srs.starts_with('+') {
            return Ok(srs.to_string());
        }
        self.srs
            .get(srs)
            .cloned()
            .ok_or_else(|| anyhow!("unknown SRS '{srs}'"))
    }
}
