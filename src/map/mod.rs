//! # Level files
//!
//! * **`.lvl`**: line-oriented text, hand-editable (see [`text`]).
//! * **`.rcal`**: compact binary (see [`raw`]).
//!
//! Every loader ends in [`Level::validate`], so a level that loads is safe
//! to render.

use std::{ffi::OsStr, fs, io, path::Path};

use log::info;
use thiserror::Error;

use crate::world::{BspError, Level, LevelError};

pub mod raw;
pub mod text;

pub use raw::{MAGIC, VERSION, from_bytes, to_bytes};
pub use text::{TextLevel, parse, to_text};

/// Extension selecting the binary format.
pub const BINARY_EXT: &str = "rcal";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not an RCAL level file")]
    BadMagic,

    #[error("unsupported RCAL version {0} (expected {expected})", expected = VERSION)]
    Version(u16),

    #[error("level name is not valid UTF-8")]
    BadName,

    #[error("level name is {0} bytes long; at most 65535 fit")]
    NameTooLong(usize),

    #[error("{what} record: {source}")]
    Record {
        what: &'static str,
        source: bincode::error::DecodeError,
    },

    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),

    #[error("node record {index}: unknown kind {kind}")]
    NodeKind { index: usize, kind: u8 },

    #[error("header promises {expected} walls, file holds {found}")]
    WallCount { expected: usize, found: usize },

    #[error("{0} trailing bytes after the last record")]
    TrailingBytes(usize),

    #[error("name `{0}` cannot be written to a text level")]
    UnwritableName(String),

    #[error("line {line}: {msg}")]
    Syntax { line: usize, msg: String },

    #[error("line {line}: {source}")]
    Tree { line: usize, source: BspError },

    #[error(transparent)]
    Level(#[from] LevelError),
}

#[inline]
fn is_binary(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|e| e.eq_ignore_ascii_case(BINARY_EXT))
}

/// Load and validate a level; `.rcal` files are binary, anything else text.
pub fn load_level<P: AsRef<Path>>(path: P) -> Result<Level, MapError> {
    let path = path.as_ref();
    let level = if is_binary(path) {
        from_bytes(&fs::read(path)?)?
    } else {
        parse(&fs::read_to_string(path)?)?
    };
    info!("loaded level `{}` from {}", level.name, path.display());
    Ok(level)
}

/// Write `level` in the format picked by the extension of `path`.
pub fn save_level<P: AsRef<Path>>(path: P, level: &Level) -> Result<(), MapError> {
    let path = path.as_ref();
    if is_binary(path) {
        fs::write(path, to_bytes(level)?)?;
    } else {
        fs::write(path, to_text(level)?)?;
    }
    info!("saved level `{}` to {}", level.name, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rca_rs_{}_{name}", std::process::id()))
    }

    #[test]
    fn extension_picks_the_format() {
        assert!(is_binary(Path::new("a/b.rcal")));
        assert!(is_binary(Path::new("B.RCAL")));
        assert!(!is_binary(Path::new("b.lvl")));
        assert!(!is_binary(Path::new("rcal")));
    }

    #[test]
    fn save_then_load_both_formats() {
        let demo = Level::demo();
        for name in ["demo.rcal", "demo.lvl"] {
            let path = scratch(name);
            save_level(&path, &demo).unwrap();
            let back = load_level(&path).unwrap();
            let _ = fs::remove_file(&path);

            assert_eq!(back.name, demo.name);
            assert_eq!(back.wall_count(), demo.wall_count());
            assert!(back.walls().eq(demo.walls()), "{name}");
        }
    }

    #[test]
    fn bundled_map_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("maps/two_rooms.lvl");
        let level = load_level(path).unwrap();
        assert_eq!(level.name, "two_rooms");
        assert_eq!(level.sectors.len(), 2);
        assert_eq!(level.wall_count(), 9);
        assert_eq!(level.walls().filter(|w| w.is_open()).count(), 1);

        let bsp = level.bsp.as_ref().unwrap();
        assert_eq!(bsp.locate(level.spawn.pos()), level.sector_id("west"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_level(scratch("does_not_exist.lvl")).unwrap_err();
        assert!(matches!(err, MapError::Io(_)));
    }
}
