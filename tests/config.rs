// tests/config.rs

mod common;
use crate::common::{ConfigFileBuilder, TestResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use tilerun::cli::CliArgs;
use tilerun::config::{ConfigFile, RawConfigFile, load_and_validate, load_from_path};
use tilerun::errors::TilerunError;
use tilerun::types::{Resampling, TileDriver, ZoomRange, parse_duration};

fn demo_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/tilerun.toml")
}

fn parse(toml_src: &str) -> Result<RawConfigFile, toml::de::Error> {
    toml::from_str(toml_src)
}

fn config_error(result: Result<ConfigFile, TilerunError>) -> String {
    match result {
        Err(TilerunError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn demo_config_loads_and_validates() -> TestResult {
    let cfg = load_and_validate(demo_config_path())?;

    assert_eq!(cfg.input, PathBuf::from("ortho/site.tif"));
    assert_eq!(cfg.output_dir, PathBuf::from("tiles/site"));
    assert_eq!(cfg.tiles.zoom, ZoomRange::new(0, 19));
    assert_eq!(cfg.tiles.driver, TileDriver::Png);
    assert_eq!(cfg.processes(), 8);
    assert!(cfg.backend.resume);
    assert_eq!(cfg.backend.extra_args, vec!["--exclude".to_string()]);
    assert_eq!(cfg.poll_interval, Duration::from_secs(1));
    assert_eq!(cfg.drain_grace, Duration::from_secs(2));
    assert_eq!(cfg.log_path(), PathBuf::from("tiles/site/gdal2tiles_log.txt"));
    assert_eq!(cfg.lock_path(), PathBuf::from("tiles/site/.tilerun.lock"));
    Ok(())
}

#[test]
fn minimal_config_gets_defaults() -> TestResult {
    let raw = parse(
        r#"
        [input]
        raster = "a.tif"
        output_dir = "out"
        "#,
    )?;
    let cfg = ConfigFile::try_from(raw)?;

    assert_eq!(cfg.tiles.zoom, ZoomRange::new(0, 19));
    assert_eq!(cfg.tiles.size, 256);
    assert_eq!(cfg.tiles.resampling, Resampling::Bilinear);
    assert_eq!(cfg.tiles.webviewer, "none");
    assert_eq!(cfg.backend.program, "python3");
    assert_eq!(cfg.backend.args, vec!["-m", "osgeo_utils.gdal2tiles"]);
    assert!(cfg.backend.resume);
    assert!(cfg.estimate.enabled);
    assert_eq!(cfg.s_srs, None);
    assert_eq!(cfg.log_file, "gdal2tiles_log.txt");
    assert_eq!(cfg.lock_file, ".tilerun.lock");
    assert!(!cfg.break_stale_lock);
    assert!(cfg.processes() >= 1);
    assert!(cfg.echo_filter.matches("Generating Base Tiles:"));
    assert!(!cfg.echo_filter.matches("0...10...20"));
    Ok(())
}

#[test]
fn zoom_accepts_numbers_and_ranges() -> TestResult {
    let raw = parse("[tiles]\nzoom = 14\n")?;
    assert_eq!(raw.tiles.zoom, ZoomRange::single(14));

    let raw = parse("[tiles]\nzoom = \"19-12\"\n")?;
    assert_eq!(raw.tiles.zoom, ZoomRange::new(12, 19));
    assert_eq!(raw.tiles.zoom.start(), 12);
    assert_eq!(raw.tiles.zoom.end(), 19);

    assert!(parse("[tiles]\nzoom = \"0-31\"\n").is_err());
    assert!(parse("[tiles]\nzoom = \"a-b\"\n").is_err());
    Ok(())
}

#[test]
fn zoom_range_parsing_and_display() {
    assert_eq!("11-10".parse::<ZoomRange>().ok(), Some(ZoomRange::new(10, 11)));
    assert_eq!(" 5 ".parse::<ZoomRange>().ok(), Some(ZoomRange::single(5)));
    assert_eq!(ZoomRange::new(0, 19).to_string(), "0-19");
    assert_eq!(ZoomRange::single(7).to_string(), "7");
    assert_eq!(ZoomRange::new(3, 5).levels().collect::<Vec<_>>(), vec![3, 4, 5]);

    for bad in ["", "-", "1-", "x", "0-99", "256"] {
        assert!(
            matches!(bad.parse::<ZoomRange>(), Err(TilerunError::InvalidZoom(_))),
            "'{bad}' should be rejected"
        );
    }
}

#[test]
fn missing_input_or_output_is_a_config_error() {
    let msg = config_error(ConfigFile::try_from(RawConfigFile::default()));
    assert!(msg.contains("input raster"));

    let mut raw = RawConfigFile::default();
    raw.input.raster = Some("a.tif".into());
    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.contains("output directory"));
}

#[test]
fn invalid_values_are_rejected() {
    let base = || ConfigFileBuilder::new("a.tif", "out").raw();

    let mut raw = base();
    raw.tiles.size = 300;
    assert!(config_error(ConfigFile::try_from(raw)).contains("power of two"));

    let mut raw = base();
    raw.tiles.webviewer = "cesium".into();
    assert!(config_error(ConfigFile::try_from(raw)).contains("webviewer"));

    let mut raw = base();
    raw.backend.processes = Some(0);
    assert!(config_error(ConfigFile::try_from(raw)).contains("processes"));

    let mut raw = base();
    raw.backend.program = "  ".into();
    assert!(config_error(ConfigFile::try_from(raw)).contains("program"));

    let mut raw = base();
    raw.run.poll_interval = "0s".into();
    assert!(config_error(ConfigFile::try_from(raw)).contains("poll_interval"));

    let mut raw = base();
    raw.run.drain_grace = "soon".into();
    assert!(config_error(ConfigFile::try_from(raw)).contains("drain_grace"));

    let mut raw = base();
    raw.run.lock_file = "../elsewhere.lock".into();
    assert!(config_error(ConfigFile::try_from(raw)).contains("lock_file"));

    let mut raw = base();
    raw.run.log_file = raw.run.lock_file.clone();
    assert!(config_error(ConfigFile::try_from(raw)).contains("must differ"));

    let mut raw = base();
    raw.backend.echo_patterns = vec!["(unclosed".into()];
    assert!(config_error(ConfigFile::try_from(raw)).contains("echo_patterns"));
}

#[test]
fn unknown_driver_fails_to_parse() {
    assert!(parse("[tiles]\ndriver = \"tiff\"\n").is_err());
}

#[test]
fn blank_srs_override_counts_as_none() -> TestResult {
    let cfg = ConfigFileBuilder::new("a.tif", "out").s_srs("   ").try_build()?;
    assert_eq!(cfg.s_srs, None);

    let cfg = ConfigFileBuilder::new("a.tif", "out").s_srs(" EPSG:4490 ").try_build()?;
    assert_eq!(cfg.s_srs.as_deref(), Some("EPSG:4490"));
    Ok(())
}

#[test]
fn cli_flags_override_the_file() -> TestResult {
    let mut raw = load_from_path(demo_config_path())?;
    let args = CliArgs::try_parse_from([
        "tilerun",
        "--input",
        "other.tif",
        "--zoom",
        "10-12",
        "--driver",
        "webp",
        "--resampling",
        "lanczos",
        "--tile-size",
        "512",
        "--processes",
        "2",
        "--s-srs",
        "EPSG:3857",
        "--no-resume",
        "--break-stale-lock",
    ])?;
    args.apply_overrides(&mut raw);
    let cfg = ConfigFile::try_from(raw)?;

    assert_eq!(cfg.input, PathBuf::from("other.tif"));
    assert_eq!(cfg.output_dir, PathBuf::from("tiles/site"));
    assert_eq!(cfg.tiles.zoom, ZoomRange::new(10, 12));
    assert_eq!(cfg.tiles.driver, TileDriver::Webp);
    assert_eq!(cfg.tile_extension(), "webp");
    assert_eq!(cfg.tiles.resampling, Resampling::Lanczos);
    assert_eq!(cfg.tiles.size, 512);
    assert_eq!(cfg.processes(), 2);
    assert_eq!(cfg.s_srs.as_deref(), Some("EPSG:3857"));
    assert!(!cfg.backend.resume);
    assert!(cfg.break_stale_lock);
    Ok(())
}

#[test]
fn cli_without_overrides_keeps_file_values() -> TestResult {
    let mut raw = load_from_path(demo_config_path())?;
    let args = CliArgs::try_parse_from(["tilerun", "--dry-run"])?;
    args.apply_overrides(&mut raw);
    let cfg = ConfigFile::try_from(raw)?;

    assert!(args.dry_run);
    assert!(cfg.backend.resume);
    assert_eq!(cfg.processes(), 8);
    Ok(())
}

#[test]
fn cli_rejects_bad_zoom_and_conflicting_modes() {
    assert!(CliArgs::try_parse_from(["tilerun", "--zoom", "x"]).is_err());
    assert!(CliArgs::try_parse_from(["tilerun", "--estimate-only", "--dry-run"]).is_err());
}

#[test]
fn duration_strings() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("5 fortnights").is_err());
}

#[test]
fn oversized_durations_are_rejected_not_wrapped() {
    let err = parse_duration("999999999999999999h").unwrap_err();
    assert!(err.contains("too large"), "{err}");
    assert!(parse_duration("999999999999999999m").is_err());
    assert_eq!(
        parse_duration("18446744073709551615s"),
        Ok(Duration::from_secs(u64::MAX))
    );

    let mut raw = ConfigFileBuilder::new("a.tif", "out").raw();
    raw.run.poll_interval = "999999999999999999h".into();
    let msg = config_error(ConfigFile::try_from(raw));
    assert!(msg.contains("poll_interval") && msg.contains("too large"), "{msg}");
}
