use serde::{Deserialize, Serialize};

use crate::cursor::{ByteSink, Cursor, Writer};
use crate::error::{Error, Result};
use crate::schema::version::GameVersion;

pub const MARKER: &[u8; 6] = b"VFSAVE";
/// Offset of the first byte counted by `file_length`.
pub const FILE_LENGTH_END: usize = MARKER.len() + 8;

pub const MIN_FORMAT_VERSION: i32 = 5;
pub const MAX_FORMAT_VERSION: i32 = 7;
const PEACE_FLAG_SINCE: i32 = 6;
const SANDBOX_FLAG_SINCE: i32 = 7;

/// Fixed-shape preamble of a `.dsv` save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Byte count of everything after this field, as stored.
    pub file_length: i64,
    pub format_version: i32,
    /// Present from format version 6.
    pub peace_mode: Option<bool>,
    /// Present from format version 7.
    pub sandbox_mode: Option<bool>,
    pub game_version: GameVersion,
    pub game_tick: i64,
    /// .NET ticks (100 ns since 0001-01-01) when the save was written.
    pub now_ticks: i64,
    /// PNG thumbnail.
    #[serde(skip)]
    pub image: Vec<u8>,
}

impl SaveHeader {
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        let marker = c.read_bytes(MARKER.len())?;
        if marker != MARKER {
            return Err(Error::invalid(
                0,
                format!("expected marker {:?}, found {:?}", MARKER, marker),
            ));
        }
        let file_length = c.read_i64()?;
        let format_version = c.read_i32()?;
        if format_version < MIN_FORMAT_VERSION {
            return Err(Error::UnsupportedFormatVersion(format_version));
        }
        if format_version > MAX_FORMAT_VERSION {
            log::warn!(
                "format version {format_version} is newer than {MAX_FORMAT_VERSION}; decoding as {MAX_FORMAT_VERSION}"
            );
        }
        let peace_mode = if format_version >= PEACE_FLAG_SINCE {
            Some(c.read_bool()?)
        } else {
            None
        };
        let sandbox_mode = if format_version >= SANDBOX_FLAG_SINCE {
            Some(c.read_bool()?)
        } else {
            None
        };
        let game_version = GameVersion::new(
            c.read_i32()?,
            c.read_i32()?,
            c.read_i32()?,
            c.read_i32()?,
        );
        let game_tick = c.read_i64()?;
        let now_ticks = c.read_i64()?;
        let image_offset = c.position();
        let image_len = c.read_i32()?;
        let image_len = usize::try_from(image_len).map_err(|_| {
            Error::invalid(image_offset, format!("negative image length {image_len}"))
        })?;
        let image = c.read_bytes(image_len)?;

        Ok(Self {
            file_length,
            format_version,
            peace_mode,
            sandbox_mode,
            game_version,
            game_tick,
            now_ticks,
            image,
        })
    }

    /// Writes the header. Flags absent from a hand-built header are written
    /// as `false` when the format version calls for them.
    pub fn emit<S: ByteSink>(&self, w: &mut Writer<S>) -> Result<()> {
        w.write_bytes(MARKER);
        w.write_i64(self.file_length);
        w.write_i32(self.format_version);
        if self.format_version >= PEACE_FLAG_SINCE {
            w.write_bool(self.peace_mode.unwrap_or(false));
        }
        if self.format_version >= SANDBOX_FLAG_SINCE {
            w.write_bool(self.sandbox_mode.unwrap_or(false));
        }
        w.write_i32(self.game_version.major);
        w.write_i32(self.game_version.minor);
        w.write_i32(self.game_version.release);
        w.write_i32(self.game_version.build);
        w.write_i64(self.game_tick);
        w.write_i64(self.now_ticks);
        let image_len = i32::try_from(self.image.len()).map_err(|_| Error::Range {
            field: "image".to_string(),
            kind: "i32",
            value: self.image.len().to_string(),
        })?;
        w.write_i32(image_len);
        w.write_bytes(&self.image);
        Ok(())
    }
}
