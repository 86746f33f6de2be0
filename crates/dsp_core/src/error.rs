use std::io;

use thiserror::Error;

use crate::schema::RecordType;
use crate::schema::version::GameVersion;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnexpectedEnd,
    InvalidEncoding,
    Range,
    LengthMismatch,
    UnknownVersionLayout,
    UnsupportedFormatVersion,
    CyclicLinkedStructure,
    BrokenLink,
    DuplicateLinkKey,
    TypeMismatch,
    MissingField,
    InvalidSchema,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset}: need {needed} bytes, {remaining} remain")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("invalid encoding at offset {offset}: {reason}")]
    InvalidEncoding { offset: usize, reason: String },
    #[error("value {value} does not fit {kind} field `{field}`")]
    Range {
        field: String,
        kind: &'static str,
        value: String,
    },
    #[error("length mismatch in `{field}`: expected {expected} elements, found {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    #[error("no known {record:?} layout for game version {version}")]
    UnknownVersionLayout {
        record: RecordType,
        version: GameVersion,
    },
    #[error("unsupported save format version {0}")]
    UnsupportedFormatVersion(i32),
    #[error("linked structure revisits key {key}")]
    CyclicLinkedStructure { key: i64 },
    #[error("link from key {from} points at missing key {to}")]
    BrokenLink { from: i64, to: i64 },
    #[error("more than one linked record has key {key}")]
    DuplicateLinkKey { key: i64 },
    #[error("field `{field}` expects {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{record:?} has no field `{field}`")]
    MissingField { record: RecordType, field: String },
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedEnd { .. } => ErrorKind::UnexpectedEnd,
            Self::InvalidEncoding { .. } => ErrorKind::InvalidEncoding,
            Self::Range { .. } => ErrorKind::Range,
            Self::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Self::UnknownVersionLayout { .. } => ErrorKind::UnknownVersionLayout,
            Self::UnsupportedFormatVersion(_) => ErrorKind::UnsupportedFormatVersion,
            Self::CyclicLinkedStructure { .. } => ErrorKind::CyclicLinkedStructure,
            Self::BrokenLink { .. } => ErrorKind::BrokenLink,
            Self::DuplicateLinkKey { .. } => ErrorKind::DuplicateLinkKey,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::InvalidSchema(_) => ErrorKind::InvalidSchema,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid(offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            offset,
            reason: reason.into(),
        }
    }
}
