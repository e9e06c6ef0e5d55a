// tests/tile_math.rs

mod common;
use crate::common::TestResult;

use proptest::prelude::*;

use tilerun::geo::tile::{clamp_lat, normalize_lon};
use tilerun::geo::{BoundingBox, MAX_LAT, MIN_LAT, TileIndex, tile_index_of};

#[test]
fn zoom_zero_is_a_single_tile() {
    for (lon, lat) in [(-180.0, 85.0), (0.0, 0.0), (179.9, -85.0), (42.0, 12.5)] {
        assert_eq!(tile_index_of(lon, lat, 0), TileIndex { z: 0, x: 0, y: 0 });
    }
}

#[test]
fn origin_at_zoom_one_is_south_east_of_centre() {
    assert_eq!(tile_index_of(0.0, 0.0, 1), TileIndex { z: 1, x: 1, y: 1 });
}

#[test]
fn world_corners_map_to_first_and_last_tile() {
    let nw = tile_index_of(-180.0, MAX_LAT, 3);
    let se = tile_index_of(180.0, MIN_LAT, 3);
    assert_eq!((nw.x, nw.y), (0, 0));
    assert_eq!((se.x, se.y), (7, 7));
}

#[test]
fn latitudes_beyond_mercator_limit_are_clamped() {
    assert_eq!(tile_index_of(10.0, 89.9, 4), tile_index_of(10.0, MAX_LAT, 4));
    assert_eq!(tile_index_of(10.0, -90.0, 4), tile_index_of(10.0, MIN_LAT, 4));
    assert_eq!(clamp_lat(90.0), MAX_LAT);
}

#[test]
fn longitudes_outside_the_world_wrap() {
    assert_eq!(normalize_lon(190.0), -170.0);
    assert_eq!(normalize_lon(-190.0), 170.0);
    assert_eq!(normalize_lon(180.0), 180.0);
    assert_eq!(tile_index_of(190.0, 0.0, 2), tile_index_of(-170.0, 0.0, 2));
}

#[test]
fn tile_index_displays_as_path_triplet() {
    let t = TileIndex { z: 19, x: 431234, y: 212345 };
    assert_eq!(t.to_string(), "19/431234/212345");
}

#[test]
fn one_degree_box_at_equator_covers_expected_tiles() -> TestResult {
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    assert_eq!(bbox.tile_count(10), 12);
    assert_eq!(bbox.tile_count(11), 42);

    let (nw, se) = bbox.tile_envelope(10);
    assert_eq!((nw.x, nw.y), (512, 509));
    assert_eq!((se.x, se.y), (514, 512));
    Ok(())
}

#[test]
fn whole_world_counts_every_tile() {
    let world = BoundingBox::whole_world();
    for z in 0..=12u8 {
        assert_eq!(world.tile_count(z), 4u64.pow(z as u32), "zoom {z}");
    }
}

#[test]
fn bbox_corners_in_any_order_give_the_same_box() {
    let a = BoundingBox::new(10.0, 50.0, 11.0, 51.0);
    let b = BoundingBox::new(11.0, 51.0, 10.0, 50.0);
    assert_eq!(a, b);
    assert_eq!(a.center(), (10.5, 50.5));
}

#[test]
fn enclosing_of_no_points_is_none() {
    assert!(BoundingBox::enclosing(&[]).is_none());
}

proptest! {
    #[test]
    fn tile_index_is_always_in_range(
        lon in -360.0f64..360.0,
        lat in -90.0f64..90.0,
        z in 0u8..=22,
    ) {
        let t = tile_index_of(lon, lat, z);
        let n = 1u64 << z;
        prop_assert_eq!(t.z, z);
        prop_assert!((t.x as u64) < n);
        prop_assert!((t.y as u64) < n);
    }

    #[test]
    fn tile_y_never_increases_going_north(
        lon in -180.0f64..180.0,
        lat_a in -85.0f64..85.0,
        lat_b in -85.0f64..85.0,
        z in 0u8..=18,
    ) {
        let (south, north) = if lat_a <= lat_b { (lat_a, lat_b) } else { (lat_b, lat_a) };
        prop_assert!(tile_index_of(lon, north, z).y <= tile_index_of(lon, south, z).y);
    }

    #[test]
    fn tile_count_grows_with_zoom(
        lon in -179.0f64..179.0,
        lat in -80.0f64..80.0,
        w in 0.001f64..1.0,
        h in 0.001f64..1.0,
        z in 0u8..=16,
    ) {
        let bbox = BoundingBox::new(lon, lat, lon + w, lat + h);
        prop_assert!(bbox.tile_count(z) >= 1);
        prop_assert!(bbox.tile_count(z + 1) >= bbox.tile_count(z));
    }
}
