//! Decode and re-encode Dyson Sphere Program `.dsv` saves.
//!
//! A save is decoded into a tree of [`Record`]s whose shapes come from the
//! layout catalog in [`schema::catalog`], selected per record by the game
//! version stored in the header. Unmodified saves re-encode byte for byte.

pub mod codec;
pub mod cursor;
pub mod error;
pub mod layout;
pub mod links;
pub mod primitive;
pub mod save;
pub mod schema;
pub mod value;
pub mod vein;

use std::io::{Read, Write};

pub use codec::{Codec, CountMismatch, EncodeOptions};
pub use error::{Error, ErrorKind, Result};
pub use primitive::CastMode;
pub use save::GameSave;
pub use save::header::SaveHeader;
pub use schema::RecordType;
pub use schema::version::GameVersion;
pub use value::{Record, Value};
pub use vein::VeinType;

pub fn decode<R: Read>(source: R) -> Result<GameSave> {
    GameSave::decode(source)
}

pub fn encode<W: Write>(save: &GameSave, sink: W) -> Result<()> {
    save.encode_with(sink, &EncodeOptions::default())
}
