// src/estimate.rs

//! A-priori tile count estimate for a raster over a zoom range.
//!
//! Estimation is best effort: anything that prevents it (probe failure, no
//! geotransform, no SRS, unusable projection) is logged and turns into
//! `None`, which switches progress reporting to its indeterminate mode.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::{Result, TilerunError};
use crate::geo::{BoundingBox, RasterInfo, RasterProbe, TileIndex, build_projector, tile_index_of};
use crate::types::ZoomRange;

/// Upper-bound tile counts per zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct RunEstimate {
    pub bbox: BoundingBox,
    pub per_zoom: BTreeMap<u8, u64>,
    pub total: u64,
}

impl RunEstimate {
    pub fn from_bbox(bbox: BoundingBox, zoom: ZoomRange) -> Self {
        let per_zoom: BTreeMap<u8, u64> = zoom.levels().map(|z| (z, bbox.tile_count(z))).collect();
        let total = per_zoom.values().sum();
        Self {
            bbox,
            per_zoom,
            total,
        }
    }

    /// Tile under the centre of the box at zoom `z`.
    pub fn sample_tile(&self, z: u8) -> TileIndex {
        let (lon, lat) = self.bbox.center();
        tile_index_of(lon, lat, z)
    }
}

/// Estimate from already-probed metadata.
///
/// `srs_override` is a PROJ.4 string that replaces the raster's own SRS.
pub fn estimate_from_info(
    info: &RasterInfo,
    srs_override: Option<&str>,
    zoom: ZoomRange,
) -> Result<RunEstimate> {
    let gt = info
        .geo_transform
        .ok_or_else(|| TilerunError::EstimationUnavailable("raster has no geotransform".into()))?;

    let proj4 = srs_override
        .or(info.proj4.as_deref())
        .ok_or_else(|| TilerunError::EstimationUnavailable("raster has no spatial reference".into()))?;

    let projector = build_projector(proj4).map_err(|e| {
        TilerunError::EstimationUnavailable(format!("cannot build projection: {e:#}"))
    })?;

    let lon_lat = gt
        .corners(info.width, info.height)
        .iter()
        .map(|&(x, y)| projector.to_lon_lat(x, y))
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(|e| TilerunError::EstimationUnavailable(format!("{e:#}")))?;

    let bbox = BoundingBox::enclosing(&lon_lat)
        .ok_or_else(|| TilerunError::EstimationUnavailable("no raster corners".into()))?;

    Ok(RunEstimate::from_bbox(bbox, zoom))
}

/// Probe `raster` and estimate, returning `None` when no estimate is possible.
pub fn estimate(
    probe: &dyn RasterProbe,
    raster: &Path,
    srs_override: Option<&str>,
    zoom: ZoomRange,
) -> Option<RunEstimate> {
    let attempt = || -> Result<RunEstimate> {
        let info = probe
            .probe(raster)
            .map_err(|e| TilerunError::EstimationUnavailable(format!("{e:#}")))?;

        let override_proj4 = srs_override
            .map(|srs| probe.resolve_srs(srs))
            .transpose()
            .map_err(|e| TilerunError::EstimationUnavailable(format!("{e:#}")))?;

        estimate_from_info(&info, override_proj4.as_deref(), zoom)
    };

    match attempt() {
        Ok(est) => {
            info!(
                total = est.total,
                min_lon = est.bbox.min_lon,
                max_lon = est.bbox.max_lon,
                min_lat = est.bbox.min_lat,
                max_lat = est.bbox.max_lat,
                "estimated tile count"
            );
            Some(est)
        }
        Err(err) => {
            warn!(raster = %raster.display(), error = %err, "continuing without a tile estimate");
            None
        }
    }
}
