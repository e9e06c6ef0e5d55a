#![allow(dead_code)]

pub use tilerun_test_utils::{
    ConfigFileBuilder, FakeRasterProbe, RecordingConsole, init_tracing, with_timeout,
};

use std::error::Error;
use std::path::{Path, PathBuf};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Create an empty stand-in raster inside `dir` and return its path.
pub fn touch_raster(dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join("site.tif");
    std::fs::write(&path, b"")?;
    Ok(path)
}

/// Shell snippet that stores the last positional argument (the output
/// directory handed to the backend) in `$out`.
pub const FIND_OUTPUT_DIR: &str = "for a; do out=$a; done; ";

/// Stub backend script that writes `count` tiles under `$out/<z>/0/`.
pub fn tile_writer_script(z: u8, count: u32) -> String {
    format!(
        "{FIND_OUTPUT_DIR}mkdir -p \"$out/{z}/0\"; \
         echo 'Generating Base Tiles:'; \
         i=0; while [ $i -lt {count} ]; do : > \"$out/{z}/0/$i.png\"; i=$((i+1)); done; \
         echo 'chatter that is not echoed'; \
         echo 'Generating Overview Tiles:' 1>&2"
    )
}
