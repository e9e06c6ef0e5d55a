// tests/estimate.rs

mod common;
use crate::common::{FakeRasterProbe, TestResult, init_tracing};

use std::path::Path;

use tilerun::errors::TilerunError;
use tilerun::estimate::{RunEstimate, estimate, estimate_from_info};
use tilerun::geo::raster::parse_gdalinfo_json;
use tilerun::geo::{BoundingBox, GeoTransform, RasterInfo, build_projector};
use tilerun::types::ZoomRange;

const WEB_MERCATOR: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs";
const UTM_32N: &str = "+proj=utm +zone=32 +datum=WGS84 +units=m +no_defs";

fn zoom(s: &str) -> ZoomRange {
    s.parse().expect("valid zoom")
}

#[test]
fn whole_world_estimate_is_four_to_the_zoom() {
    let est = RunEstimate::from_bbox(BoundingBox::whole_world(), zoom("0-3"));
    assert_eq!(est.per_zoom.get(&0), Some(&1));
    assert_eq!(est.per_zoom.get(&1), Some(&4));
    assert_eq!(est.per_zoom.get(&2), Some(&16));
    assert_eq!(est.per_zoom.get(&3), Some(&64));
    assert_eq!(est.total, 85);
}

#[test]
fn one_degree_geographic_raster_over_two_zooms() -> TestResult {
    init_tracing();
    let probe = FakeRasterProbe::geographic(0.0, 0.0, 1.0, 1.0);

    let est = estimate(&probe, Path::new("site.tif"), None, zoom("10-11"))
        .ok_or("estimate should be available")?;

    assert_eq!(est.per_zoom.get(&10), Some(&12));
    assert_eq!(est.per_zoom.get(&11), Some(&42));
    assert_eq!(est.total, 54);
    assert_eq!(probe.probed(), vec![Path::new("site.tif").to_path_buf()]);
    Ok(())
}

#[test]
fn reversed_zoom_range_gives_the_same_estimate() {
    let probe = FakeRasterProbe::geographic(0.0, 0.0, 1.0, 1.0);
    let a = estimate(&probe, Path::new("a.tif"), None, zoom("10-11"));
    let b = estimate(&probe, Path::new("a.tif"), None, zoom("11-10"));
    assert_eq!(a, b);
}

#[test]
fn sample_tile_sits_under_the_box_centre() {
    let est = RunEstimate::from_bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0), zoom("10"));
    let t = est.sample_tile(10);
    assert_eq!((t.z, t.x, t.y), (10, 513, 510));
}

#[test]
fn probe_failure_yields_no_estimate() {
    init_tracing();
    let probe = FakeRasterProbe::failing("gdalinfo: not found");
    assert!(estimate(&probe, Path::new("x.tif"), None, zoom("0-5")).is_none());
}

#[test]
fn raster_without_geotransform_is_unavailable() {
    let info = RasterInfo {
        width: 100,
        height: 100,
        geo_transform: None,
        proj4: Some("+proj=longlat +datum=WGS84 +no_defs".into()),
    };
    let err = estimate_from_info(&info, None, zoom("0-5")).unwrap_err();
    assert!(matches!(err, TilerunError::EstimationUnavailable(_)));

    let probe = FakeRasterProbe::with_info(info);
    assert!(estimate(&probe, Path::new("x.tif"), None, zoom("0-5")).is_none());
}

#[test]
fn raster_without_srs_needs_an_override() -> TestResult {
    let info = RasterInfo {
        width: 1000,
        height: 1000,
        geo_transform: Some(GeoTransform::north_up(0.0, 1.0, 0.001)),
        proj4: None,
    };
    let err = estimate_from_info(&info, None, zoom("10")).unwrap_err();
    assert!(matches!(err, TilerunError::EstimationUnavailable(_)));

    let probe = FakeRasterProbe::with_info(info)
        .with_srs("EPSG:4490", "+proj=longlat +ellps=GRS80 +no_defs");
    let est = estimate(&probe, Path::new("x.tif"), Some("EPSG:4490"), zoom("10"))
        .ok_or("override SRS should make the estimate available")?;
    assert_eq!(est.total, 12);
    Ok(())
}

#[test]
fn unresolvable_srs_override_yields_no_estimate() {
    let probe = FakeRasterProbe::geographic(0.0, 0.0, 1.0, 1.0);
    assert!(estimate(&probe, Path::new("x.tif"), Some("EPSG:999999"), zoom("10")).is_none());
}

#[test]
fn rotated_geotransform_uses_all_four_corners() -> TestResult {
    // 45 degree rotation: the second row/column terms are non-zero, so the
    // western- and southernmost points are not the origin corner.
    let s = 0.001 / std::f64::consts::SQRT_2;
    let info = RasterInfo {
        width: 1000,
        height: 1000,
        geo_transform: Some(GeoTransform([0.0, s, s, 1.0, s, -s])),
        proj4: Some("+proj=longlat +datum=WGS84 +no_defs".into()),
    };
    let est = estimate_from_info(&info, None, zoom("10"))?;
    let b = est.bbox;
    assert!((b.min_lon - 0.0).abs() < 1e-9);
    assert!((b.max_lon - 2.0 * 1000.0 * s).abs() < 1e-9);
    assert!((b.max_lat - (1.0 + 1000.0 * s)).abs() < 1e-9);
    assert!((b.min_lat - (1.0 - 1000.0 * s)).abs() < 1e-9);
    Ok(())
}

#[test]
fn web_mercator_raster_is_inverted_inline() -> TestResult {
    let projector = build_projector(WEB_MERCATOR)?;
    let (lon, lat) = projector.to_lon_lat(20_037_508.342_789_244, 0.0)?;
    assert!((lon - 180.0).abs() < 1e-9);
    assert!(lat.abs() < 1e-9);

    let (_, lat) = projector.to_lon_lat(0.0, 20_037_508.342_789_244)?;
    assert!((lat - 85.051_128_78).abs() < 1e-6);

    // Whole-world 3857 raster.
    let info = RasterInfo {
        width: 256,
        height: 256,
        geo_transform: Some(GeoTransform::north_up(
            -20_037_508.342_789_244,
            20_037_508.342_789_244,
            2.0 * 20_037_508.342_789_244 / 256.0,
        )),
        proj4: Some(WEB_MERCATOR.into()),
    };
    let est = estimate_from_info(&info, None, zoom("0-2"))?;
    assert_eq!(est.total, 1 + 4 + 16);
    Ok(())
}

#[test]
fn utm_raster_goes_through_proj4rs() -> TestResult {
    let projector = build_projector(UTM_32N)?;
    let (lon, lat) = projector.to_lon_lat(500_000.0, 5_000_000.0)?;
    // Central meridian of zone 32 is 9 E.
    assert!((lon - 9.0).abs() < 1e-6, "lon was {lon}");
    assert!(lat > 45.0 && lat < 45.3, "lat was {lat}");
    Ok(())
}

#[test]
fn projection_without_proj_parameter_is_rejected() {
    assert!(build_projector("+datum=WGS84 +no_defs").is_err());
}

#[test]
fn gdalinfo_json_is_parsed() -> TestResult {
    let json = r#"{
        "description": "site.tif",
        "driverShortName": "GTiff",
        "size": [4000, 3000],
        "coordinateSystem": {
            "wkt": "GEOGCRS[\"WGS 84\", ...]",
            "proj4": "+proj=longlat +datum=WGS84 +no_defs"
        },
        "geoTransform": [10.0, 0.0001, 0.0, 50.0, 0.0, -0.0001],
        "bands": []
    }"#;

    let info = parse_gdalinfo_json(json)?;
    assert_eq!((info.width, info.height), (4000, 3000));
    assert_eq!(
        info.geo_transform,
        Some(GeoTransform([10.0, 0.0001, 0.0, 50.0, 0.0, -0.0001]))
    );
    assert_eq!(info.proj4.as_deref(), Some("+proj=longlat +datum=WGS84 +no_defs"));
    Ok(())
}

#[test]
fn gdalinfo_json_without_srs_or_transform() -> TestResult {
    let json = r#"{
        "size": [10, 10],
        "coordinateSystem": { "wkt": "" },
        "bands": []
    }"#;

    let info = parse_gdalinfo_json(json)?;
    assert_eq!(info.geo_transform, None);
    assert_eq!(info.proj4, None);
    Ok(())
}

#[test]
fn malformed_gdalinfo_json_is_an_error() {
    assert!(parse_gdalinfo_json("gdalinfo failed: not a raster").is_err());
}
