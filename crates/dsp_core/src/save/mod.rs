//! The save file as a whole: header, account section, game data and any
//! bytes that follow.
//!
//! `header.file_length` is stored, not derived. Decoding leaves it as read
//! and encoding writes it as is; after a change that alters the encoded size
//! the caller assigns [`GameSave::encoded_length`] to it, or calls
//! [`GameSave::recompute_file_length`].

pub mod header;

use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::codec::{Codec, CountMismatch, EncodeOptions};
use crate::cursor::{ByteSink, Cursor, LengthCounter, Writer};
use crate::error::{Error, Result};
use crate::layout::{ByteRange, FileLayout, SectionId, SectionLayout};
use crate::links::{self, LinkSpec};
use crate::primitive::CastMode;
use crate::schema::RecordType;
use crate::schema::version::GameVersion;
use crate::value::Record;
use crate::vein::VeinType;
use header::{FILE_LENGTH_END, SaveHeader};

#[derive(Debug, Clone)]
pub struct GameSave {
    pub header: SaveHeader,
    pub account: Record,
    pub game_data: Record,
    /// Bytes after the game data, written back verbatim.
    pub trailing: Vec<u8>,
    layout: FileLayout,
}

impl GameSave {
    pub fn decode<R: Read>(mut source: R) -> Result<Self> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        let mut sections = Vec::new();

        let header = SaveHeader::parse(&mut c)?;
        record_section(&mut sections, SectionId::Header, 0, c.position());
        log::debug!(
            "header: format {} game {} [0-{}]",
            header.format_version,
            header.game_version,
            c.position()
        );

        let codec = Codec::standard(header.game_version);
        let account = codec.decode_record(&mut c, RecordType::Account)?;
        record_section(
            &mut sections,
            SectionId::Account,
            account.span().start,
            account.span().end,
        );

        let game_data = codec.decode_record(&mut c, RecordType::GameData)?;
        record_section(
            &mut sections,
            SectionId::GameData,
            game_data.span().start,
            game_data.span().end,
        );

        let tail_start = c.position();
        let trailing = c.read_rest();
        if !trailing.is_empty() {
            log::warn!("{} trailing bytes after game data", trailing.len());
            record_section(&mut sections, SectionId::Tail, tail_start, bytes.len());
        }

        let remainder = bytes.len() - FILE_LENGTH_END;
        if usize::try_from(header.file_length).ok() != Some(remainder) {
            log::warn!(
                "stored file length {} disagrees with {} bytes present",
                header.file_length,
                remainder
            );
        }

        let layout = FileLayout {
            file_len: bytes.len(),
            sections,
        };
        layout.validate()?;

        Ok(Self {
            header,
            account,
            game_data,
            trailing,
            layout,
        })
    }

    pub fn version(&self) -> GameVersion {
        self.header.game_version
    }

    /// Record codec for this save's game version.
    pub fn codec(&self) -> Codec<'static> {
        Codec::standard(self.header.game_version)
    }

    /// Section spans of the decoded source.
    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    /// Writes the encoded save to `sink`. Nothing is written unless the whole
    /// save encodes.
    pub fn encode_with<W: Write>(&self, mut sink: W, options: &EncodeOptions) -> Result<()> {
        let bytes = self.to_bytes_with(options)?;
        sink.write_all(&bytes)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(&EncodeOptions::default())
    }

    pub fn to_bytes_with(&self, options: &EncodeOptions) -> Result<Vec<u8>> {
        let mut w = Writer::new(Vec::with_capacity(self.layout.file_len));
        self.write_to(&mut w, options)?;
        Ok(w.into_inner())
    }

    fn write_to<S: ByteSink>(&self, w: &mut Writer<S>, options: &EncodeOptions) -> Result<()> {
        let codec = self.codec();
        self.header.emit(w)?;
        let start = w.position();
        codec.encode_record(w, &self.account, options)?;
        log::debug!("account encoded [{}]", ByteRange::new(start, w.position()));
        let start = w.position();
        codec.encode_record(w, &self.game_data, options)?;
        log::debug!("game data encoded [{}]", ByteRange::new(start, w.position()));
        w.write_bytes(&self.trailing);
        Ok(())
    }

    /// Exact byte count after the `file_length` field for the current
    /// contents.
    pub fn encoded_length(&self) -> Result<usize> {
        // Cast mode never changes a field's width.
        let options = EncodeOptions {
            cast: CastMode::Wrapping,
            strict_counts: false,
        };
        let mut counter = Writer::new(LengthCounter::new());
        self.write_to(&mut counter, &options)?;
        Ok(counter.position() - FILE_LENGTH_END)
    }

    /// Stores [`GameSave::encoded_length`] in `header.file_length`.
    pub fn recompute_file_length(&mut self) -> Result<()> {
        let len = self.encoded_length()?;
        self.header.file_length = i64::try_from(len).map_err(|_| Error::Range {
            field: "file_length".to_string(),
            kind: "i64",
            value: len.to_string(),
        })?;
        Ok(())
    }

    /// Counted arrays anywhere in the save whose length differs from their
    /// count field.
    pub fn check_counts(&self) -> Result<Vec<CountMismatch>> {
        let codec = self.codec();
        let mut found = codec.check_counts(&self.account)?;
        found.extend(codec.check_counts(&self.game_data)?);
        Ok(found)
    }

    pub fn user_name(&self) -> Option<&str> {
        self.account.str("user_name")
    }

    pub fn set_user_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.account.set_str("user_name", name)
    }

    pub fn game_name(&self) -> Option<&str> {
        self.game_data.str("game_name")
    }

    pub fn set_game_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.game_data.set_str("game_name", name)
    }

    pub fn player(&self) -> Option<&Record> {
        self.game_data.record("player")
    }

    pub fn sand_count(&self) -> Option<i64> {
        self.player().and_then(|p| p.int("sand_count"))
    }

    pub fn set_sand_count(&mut self, sand: i64) -> Result<()> {
        self.game_data
            .record_mut("player")
            .ok_or_else(|| missing(RecordType::GameData, "player"))?
            .set_int("sand_count", sand)
    }

    pub fn factories(&self) -> impl Iterator<Item = &Record> {
        self.game_data.records("factories")
    }

    pub fn factory(&self, index: usize) -> Result<&Record> {
        self.factories()
            .nth(index)
            .ok_or_else(|| missing(RecordType::GameData, &format!("factories[{index}]")))
    }

    /// Veins of one factory, wherever this save's version keeps them.
    pub fn veins(&self, factory_index: usize) -> Result<Vec<&Record>> {
        let factory = self.factory(factory_index)?;
        let layout = self
            .codec()
            .selector()
            .select(RecordType::PlanetFactory, self.version())?;
        let holder = if layout.has_field("veins") {
            factory
        } else {
            factory
                .record("planet")
                .ok_or_else(|| missing(RecordType::PlanetFactory, "planet"))?
        };
        Ok(holder.records("veins").collect())
    }

    /// Total vein amount per resource type on one factory's planet.
    pub fn vein_totals(&self, factory_index: usize) -> Result<BTreeMap<VeinType, i64>> {
        let mut totals = BTreeMap::new();
        for vein in self.veins(factory_index)? {
            let raw = vein
                .int("vein_type")
                .ok_or_else(|| missing(RecordType::VeinData, "vein_type"))?;
            let kind = i16::try_from(raw)
                .map(VeinType::from_raw)
                .map_err(|_| Error::Range {
                    field: "vein_type".to_string(),
                    kind: "i16",
                    value: raw.to_string(),
                })?;
            let amount = vein
                .int("amount")
                .ok_or_else(|| missing(RecordType::VeinData, "amount"))?;
            *totals.entry(kind).or_insert(0) += amount;
        }
        Ok(totals)
    }

    /// Belts from `start_id` following `output_id` until a belt outputs to
    /// nothing.
    pub fn belt_chain(&self, factory_index: usize, start_id: i64) -> Result<Vec<&Record>> {
        let factory = self.factory(factory_index)?;
        links::follow(factory.records("belts"), start_id, &LinkSpec::BELT)
    }
}

fn record_section(sections: &mut Vec<SectionLayout>, id: SectionId, start: usize, end: usize) {
    sections.push(SectionLayout {
        id,
        range: ByteRange::new(start, end),
    });
}

fn missing(record: RecordType, field: &str) -> Error {
    Error::MissingField {
        record,
        field: field.to_string(),
    }
}
