//! Fixed-width scalars and length-prefixed strings.
//!
//! Every `read_scalar` has a `write_scalar` inverse: re-encoding a value that
//! was just decoded yields the same bytes. Values handed in by callers pass
//! through [`ScalarKind::coerce`] first, which is where the save-time casting
//! rules live.

use crate::cursor::{ByteSink, Cursor, Writer};
use crate::error::{Error, Result};
use crate::value::Value;

/// Width of a string's length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrPrefix {
    /// .NET 7-bit encoded length.
    VarInt,
    I32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    /// Three-byte signed integer, held as `i32`.
    I24,
    U32,
    I32,
    /// Variable-width `i32`: 1 to 5 bytes, see [`Cursor::read_flexible_int`].
    FlexibleInt,
    U64,
    I64,
    F32,
    F64,
    Str(StrPrefix),
}

pub const I24_MIN: i32 = -0x80_0000;
pub const I24_MAX: i32 = 0x7F_FFFF;

/// How out-of-range values are treated on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CastMode {
    /// Reject values that don't fit the declared width.
    #[default]
    Checked,
    /// Mask integers to the declared bit width and narrow floats.
    Wrapping,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::I24 => "i24",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::FlexibleInt => "flexible int",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Str(_) => "string",
        }
    }

    /// Encoded width in bytes, `None` when it depends on the value.
    pub fn width(self) -> Option<usize> {
        match self {
            Self::Bool | Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::I24 => Some(3),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::F64 => Some(8),
            Self::FlexibleInt | Self::Str(_) => None,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64 | Self::Str(_))
    }

    /// Converts `value` into this kind's exact variant.
    ///
    /// Integers of any width convert to any integer kind when the value fits;
    /// with [`CastMode::Wrapping`] they are masked to the target width instead.
    /// `f64` narrows to `f32` when exact, or unconditionally when wrapping.
    pub fn coerce(self, field: &str, value: &Value, mode: CastMode) -> Result<Value> {
        if value.matches(self) {
            return Ok(value.clone());
        }
        if self.is_integer()
            && let Some(raw) = value.as_i128()
        {
            return self.cast_int(field, raw, mode);
        }
        match (self, value) {
            (Self::F64, Value::F32(v)) => Ok(Value::F64(f64::from(*v))),
            (Self::F32, Value::F64(v)) if mode == CastMode::Wrapping => Ok(Value::F32(*v as f32)),
            (Self::F32, Value::F64(v)) => {
                let narrowed = *v as f32;
                if f64::from(narrowed) == *v || v.is_nan() {
                    Ok(Value::F32(narrowed))
                } else {
                    Err(self.range_error(field, v))
                }
            }
            _ => Err(Error::TypeMismatch {
                field: field.to_string(),
                expected: self.name(),
                found: value.type_name(),
            }),
        }
    }

    fn cast_int(self, field: &str, raw: i128, mode: CastMode) -> Result<Value> {
        macro_rules! int {
            ($ty:ty, $variant:ident) => {
                match <$ty>::try_from(raw) {
                    Ok(v) => Ok(Value::$variant(v)),
                    Err(_) if mode == CastMode::Wrapping => Ok(Value::$variant(raw as $ty)),
                    Err(_) => Err(self.range_error(field, raw)),
                }
            };
        }
        match self {
            Self::Bool => match raw {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                _ if mode == CastMode::Wrapping => Ok(Value::Bool(raw & 1 == 1)),
                _ => Err(self.range_error(field, raw)),
            },
            Self::U8 => int!(u8, U8),
            Self::I8 => int!(i8, I8),
            Self::U16 => int!(u16, U16),
            Self::I16 => int!(i16, I16),
            Self::I24 => match i32::try_from(raw) {
                Ok(v) if (I24_MIN..=I24_MAX).contains(&v) => Ok(Value::I32(v)),
                _ if mode == CastMode::Wrapping => Ok(Value::I32(((raw as i32) << 8) >> 8)),
                _ => Err(self.range_error(field, raw)),
            },
            Self::U32 => int!(u32, U32),
            Self::I32 | Self::FlexibleInt => int!(i32, I32),
            Self::U64 => int!(u64, U64),
            Self::I64 => int!(i64, I64),
            Self::F32 | Self::F64 | Self::Str(_) => Err(Error::TypeMismatch {
                field: field.to_string(),
                expected: self.name(),
                found: "integer",
            }),
        }
    }

    fn range_error(self, field: &str, value: impl ToString) -> Error {
        Error::Range {
            field: field.to_string(),
            kind: self.name(),
            value: value.to_string(),
        }
    }
}

pub fn read_scalar(c: &mut Cursor<'_>, kind: ScalarKind) -> Result<Value> {
    Ok(match kind {
        ScalarKind::Bool => Value::Bool(c.read_bool()?),
        ScalarKind::U8 => Value::U8(c.read_u8()?),
        ScalarKind::I8 => Value::I8(c.read_i8()?),
        ScalarKind::U16 => Value::U16(c.read_u16()?),
        ScalarKind::I16 => Value::I16(c.read_i16()?),
        ScalarKind::I24 => Value::I32(c.read_i24()?),
        ScalarKind::U32 => Value::U32(c.read_u32()?),
        ScalarKind::I32 => Value::I32(c.read_i32()?),
        ScalarKind::FlexibleInt => Value::I32(c.read_flexible_int()?),
        ScalarKind::U64 => Value::U64(c.read_u64()?),
        ScalarKind::I64 => Value::I64(c.read_i64()?),
        ScalarKind::F32 => Value::F32(c.read_f32()?),
        ScalarKind::F64 => Value::F64(c.read_f64()?),
        ScalarKind::Str(prefix) => Value::Str(read_string(c, prefix)?),
    })
}

pub fn read_string(c: &mut Cursor<'_>, prefix: StrPrefix) -> Result<String> {
    let start = c.position();
    let len = match prefix {
        StrPrefix::VarInt => c.read_var_u32()? as usize,
        StrPrefix::I32 => {
            let raw = c.read_i32()?;
            usize::try_from(raw)
                .map_err(|_| Error::invalid(start, format!("negative string length {raw}")))?
        }
    };
    c.read_utf8(len)
}

/// Writes `value`, which must already be `kind`'s exact variant.
pub fn write_scalar<S: ByteSink>(
    w: &mut Writer<S>,
    field: &str,
    kind: ScalarKind,
    value: &Value,
) -> Result<()> {
    match (kind, value) {
        (ScalarKind::Bool, Value::Bool(v)) => w.write_bool(*v),
        (ScalarKind::U8, Value::U8(v)) => w.write_u8(*v),
        (ScalarKind::I8, Value::I8(v)) => w.write_i8(*v),
        (ScalarKind::U16, Value::U16(v)) => w.write_u16(*v),
        (ScalarKind::I16, Value::I16(v)) => w.write_i16(*v),
        (ScalarKind::I24, Value::I32(v)) if (I24_MIN..=I24_MAX).contains(v) => w.write_i24(*v),
        (ScalarKind::I24, Value::I32(v)) => return Err(kind.range_error(field, v)),
        (ScalarKind::U32, Value::U32(v)) => w.write_u32(*v),
        (ScalarKind::I32, Value::I32(v)) => w.write_i32(*v),
        (ScalarKind::FlexibleInt, Value::I32(v)) => w.write_flexible_int(*v),
        (ScalarKind::U64, Value::U64(v)) => w.write_u64(*v),
        (ScalarKind::I64, Value::I64(v)) => w.write_i64(*v),
        (ScalarKind::F32, Value::F32(v)) => w.write_f32(*v),
        (ScalarKind::F64, Value::F64(v)) => w.write_f64(*v),
        (ScalarKind::Str(prefix), Value::Str(s)) => write_string(w, field, prefix, s)?,
        _ => {
            return Err(Error::TypeMismatch {
                field: field.to_string(),
                expected: kind.name(),
                found: value.type_name(),
            });
        }
    }
    Ok(())
}

pub fn write_string<S: ByteSink>(
    w: &mut Writer<S>,
    field: &str,
    prefix: StrPrefix,
    s: &str,
) -> Result<()> {
    let too_long = || Error::Range {
        field: field.to_string(),
        kind: "string length",
        value: s.len().to_string(),
    };
    match prefix {
        StrPrefix::VarInt => w.write_var_u32(u32::try_from(s.len()).map_err(|_| too_long())?),
        StrPrefix::I32 => w.write_i32(i32::try_from(s.len()).map_err(|_| too_long())?),
    }
    w.write_bytes(s.as_bytes());
    Ok(())
}
