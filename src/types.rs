// src/types.rs

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::errors::TilerunError;

/// Highest zoom level accepted from configuration.
///
/// Keeps `4^z` tile counts inside `u64`.
pub const MAX_ZOOM: u8 = 30;

/// Inclusive range of zoom levels, e.g. `"0-19"` or `"12"`.
///
/// Parsing takes min/max of the two ends, so `"11-10"` is the same range as
/// `"10-11"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ZoomSpec")]
pub struct ZoomRange {
    start: u8,
    end: u8,
}

impl ZoomRange {
    pub fn new(a: u8, b: u8) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn single(z: u8) -> Self {
        Self::new(z, z)
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    pub fn levels(&self) -> RangeInclusive<u8> {
        self.start..=self.end
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for ZoomRange {
    type Err = TilerunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_level = |part: &str| -> Result<u8, TilerunError> {
            let part = part.trim();
            part.parse::<u8>()
                .map_err(|e| TilerunError::InvalidZoom(format!("'{s}': '{part}' {e}")))
        };

        let range = match s.split_once('-') {
            Some((a, b)) => ZoomRange::new(parse_level(a)?, parse_level(b)?),
            None => ZoomRange::single(parse_level(s)?),
        };

        if range.end > MAX_ZOOM {
            return Err(TilerunError::InvalidZoom(format!(
                "'{s}': zoom {} exceeds the maximum of {MAX_ZOOM}",
                range.end
            )));
        }

        Ok(range)
    }
}

/// TOML accepts `zoom = 12` as well as `zoom = "0-19"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ZoomSpec {
    Level(u8),
    Range(String),
}

impl TryFrom<ZoomSpec> for ZoomRange {
    type Error = TilerunError;

    fn try_from(spec: ZoomSpec) -> Result<Self, Self::Error> {
        match spec {
            ZoomSpec::Level(z) => z.to_string().parse(),
            ZoomSpec::Range(s) => s.parse(),
        }
    }
}

/// Image driver the backend encodes tiles with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TileDriver {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl TileDriver {
    /// Value passed to the backend's `--tiledriver` flag.
    pub fn as_flag(&self) -> &'static str {
        match self {
            TileDriver::Png => "PNG",
            TileDriver::Jpeg => "JPEG",
            TileDriver::Webp => "WEBP",
        }
    }

    /// File extension of the tiles written for this driver.
    pub fn extension(&self) -> &'static str {
        match self {
            TileDriver::Png => "png",
            TileDriver::Jpeg => "jpg",
            TileDriver::Webp => "webp",
        }
    }
}

/// Resampling methods understood by `gdal2tiles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    Average,
    Near,
    #[default]
    Bilinear,
    Cubic,
    Cubicspline,
    Lanczos,
    Antialias,
    Mode,
    Max,
    Min,
    Med,
    Q1,
    Q3,
}

impl Resampling {
    pub fn as_flag(&self) -> &'static str {
        match self {
            Resampling::Average => "average",
            Resampling::Near => "near",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::Cubicspline => "cubicspline",
            Resampling::Lanczos => "lanczos",
            Resampling::Antialias => "antialias",
            Resampling::Mode => "mode",
            Resampling::Max => "max",
            Resampling::Min => "min",
            Resampling::Med => "med",
            Resampling::Q1 => "q1",
            Resampling::Q3 => "q3",
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
