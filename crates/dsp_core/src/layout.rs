use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Half-open byte range `[start, end)` in a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionId {
    Header,
    Account,
    GameData,
    Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    pub fn section(&self, id: SectionId) -> Option<ByteRange> {
        self.sections
            .iter()
            .find(|section| section.id == id)
            .map(|section| section.range)
    }

    /// Checks that the sections tile the file from byte 0 to `file_len`
    /// without gaps or overlaps.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.sections.first() else {
            return Err(Error::InvalidSchema(
                "file layout must contain at least one section".to_string(),
            ));
        };

        if first.range.start != 0 {
            return Err(Error::InvalidSchema(
                "layout does not start at byte 0".to_string(),
            ));
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(Error::InvalidSchema(format!(
                    "layout gap/overlap around section {:?}: expected start {}, got {}",
                    section.id, expected, section.range.start
                )));
            }
            if section.range.end < section.range.start {
                return Err(Error::InvalidSchema(format!(
                    "invalid section range {:?}: {}",
                    section.id, section.range
                )));
            }
            expected = section.range.end;
        }

        if expected != self.file_len {
            return Err(Error::InvalidSchema(format!(
                "layout does not cover file: ended at {}, file length {}",
                expected, self.file_len
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteRange, FileLayout, SectionId, SectionLayout};

    fn section(id: SectionId, start: usize, end: usize) -> SectionLayout {
        SectionLayout {
            id,
            range: ByteRange::new(start, end),
        }
    }

    #[test]
    fn contiguous_sections_validate() {
        let layout = FileLayout {
            file_len: 30,
            sections: vec![
                section(SectionId::Header, 0, 10),
                section(SectionId::Account, 10, 18),
                section(SectionId::GameData, 18, 30),
            ],
        };
        layout.validate().unwrap();
        assert_eq!(layout.section(SectionId::Account), Some(ByteRange::new(10, 18)));
        assert_eq!(layout.section(SectionId::Tail), None);
    }

    #[test]
    fn gaps_and_short_coverage_are_rejected() {
        let gap = FileLayout {
            file_len: 30,
            sections: vec![
                section(SectionId::Header, 0, 10),
                section(SectionId::Account, 12, 30),
            ],
        };
        assert!(gap.validate().is_err());

        let short = FileLayout {
            file_len: 31,
            sections: vec![section(SectionId::Header, 0, 30)],
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn layout_serializes_with_named_sections() {
        let layout = FileLayout {
            file_len: 8,
            sections: vec![section(SectionId::Header, 0, 8)],
        };
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["sections"][0]["id"], "Header");
        assert_eq!(json["sections"][0]["range"]["end"], 8);
    }
}
