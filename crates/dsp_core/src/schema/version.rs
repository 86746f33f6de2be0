use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Layout, RecordType};
use crate::error::{Error, Result};

/// Game build that wrote a save. Ordered field by field, major first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameVersion {
    pub major: i32,
    pub minor: i32,
    pub release: i32,
    pub build: i32,
}

impl GameVersion {
    pub const fn new(major: i32, minor: i32, release: i32, build: i32) -> Self {
        Self {
            major,
            minor,
            release,
            build,
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.release, self.build
        )
    }
}

/// Oldest build any known layout describes.
pub const EARLIEST_SUPPORTED: GameVersion = GameVersion::new(0, 8, 0, 0);
/// Vein data moved from `PlanetData` into `PlanetFactory`.
pub const VEIN_RELOCATION: GameVersion = GameVersion::new(0, 9, 24, 11182);
/// Mecha gained reactor output and drone count.
pub const DRONE_UPGRADE: GameVersion = GameVersion::new(0, 10, 28, 0);

/// Picks the field layout each record type uses for a given game version.
///
/// Each record type has one or more layouts keyed by the version that
/// introduced them. A version selects the newest layout introduced at or
/// before it; versions newer than every breakpoint get the newest layout and
/// versions older than every layout are rejected.
#[derive(Debug, Clone, Default)]
pub struct VersionSelector {
    layouts: BTreeMap<RecordType, Vec<Layout>>,
}

impl VersionSelector {
    pub fn new(layouts: impl IntoIterator<Item = Layout>) -> Self {
        let mut table: BTreeMap<RecordType, Vec<Layout>> = BTreeMap::new();
        for layout in layouts {
            table.entry(layout.record).or_default().push(layout);
        }
        for variants in table.values_mut() {
            variants.sort_by_key(|layout| layout.since);
        }
        Self { layouts: table }
    }

    pub fn select(&self, record: RecordType, version: GameVersion) -> Result<&Layout> {
        let variants = self.layouts(record);
        if variants.is_empty() {
            return Err(Error::InvalidSchema(format!("no layouts for {record}")));
        }
        let layout = variants
            .iter()
            .rev()
            .find(|layout| layout.since <= version)
            .ok_or(Error::UnknownVersionLayout { record, version })?;
        log::trace!("{record}: layout since {} for {version}", layout.since);
        Ok(layout)
    }

    pub fn layouts(&self, record: RecordType) -> &[Layout] {
        self.layouts.get(&record).map(Vec::as_slice).unwrap_or_default()
    }

    /// Versions at which `record` changed shape, oldest first.
    pub fn breakpoints(&self, record: RecordType) -> Vec<GameVersion> {
        self.layouts(record).iter().map(|l| l.since).collect()
    }

    /// Validates every layout and rejects two layouts sharing a breakpoint.
    pub fn validate(&self) -> Result<()> {
        for (record, variants) in &self.layouts {
            for pair in variants.windows(2) {
                if pair[0].since == pair[1].since {
                    return Err(Error::InvalidSchema(format!(
                        "{record} has two layouts since {}",
                        pair[0].since
                    )));
                }
            }
            for layout in variants {
                layout.validate()?;
            }
        }
        Ok(())
    }
}
