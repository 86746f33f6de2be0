use crate::error::{Error, Result};
use crate::layout::ByteRange;
use crate::primitive::{CastMode, I24_MAX, I24_MIN, ScalarKind};
use crate::schema::RecordType;

/// One decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Arrays of `u8` are kept as one blob.
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Record(Record),
    /// An optional field whose gate was closed.
    Absent,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::I8(_) => "i8",
            Self::U16(_) => "u16",
            Self::I16(_) => "i16",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Record(_) => "record",
            Self::Absent => "absent",
        }
    }

    pub fn matches(&self, kind: ScalarKind) -> bool {
        if let (ScalarKind::I24, Self::I32(v)) = (kind, self) {
            return (I24_MIN..=I24_MAX).contains(v);
        }
        matches!(
            (kind, self),
            (ScalarKind::Bool, Self::Bool(_))
                | (ScalarKind::U8, Self::U8(_))
                | (ScalarKind::I8, Self::I8(_))
                | (ScalarKind::U16, Self::U16(_))
                | (ScalarKind::I16, Self::I16(_))
                | (ScalarKind::U32, Self::U32(_))
                | (ScalarKind::I32 | ScalarKind::FlexibleInt, Self::I32(_))
                | (ScalarKind::U64, Self::U64(_))
                | (ScalarKind::I64, Self::I64(_))
                | (ScalarKind::F32, Self::F32(_))
                | (ScalarKind::F64, Self::F64(_))
                | (ScalarKind::Str(_), Self::Str(_))
        )
    }

    pub(crate) fn as_i128(&self) -> Option<i128> {
        Some(match *self {
            Self::Bool(v) => i128::from(v),
            Self::U8(v) => i128::from(v),
            Self::I8(v) => i128::from(v),
            Self::U16(v) => i128::from(v),
            Self::I16(v) => i128::from(v),
            Self::U32(v) => i128::from(v),
            Self::I32(v) => i128::from(v),
            Self::U64(v) => i128::from(v),
            Self::I64(v) => i128::from(v),
            _ => return None,
        })
    }

    /// Integer (or boolean) value widened to `i64`; `u64` values above
    /// `i64::MAX` yield `None`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(f64::from(v)),
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Element count of a list or blob.
    pub fn element_count(&self) -> Option<usize> {
        match self {
            Self::List(items) => Some(items.len()),
            Self::Bytes(bytes) => Some(bytes.len()),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    fn scalar_kind(&self) -> Option<ScalarKind> {
        Some(match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::U8(_) => ScalarKind::U8,
            Self::I8(_) => ScalarKind::I8,
            Self::U16(_) => ScalarKind::U16,
            Self::I16(_) => ScalarKind::I16,
            Self::U32(_) => ScalarKind::U32,
            Self::I32(_) => ScalarKind::I32,
            Self::U64(_) => ScalarKind::U64,
            Self::I64(_) => ScalarKind::I64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            _ => return None,
        })
    }
}

/// One decoded entity: its type, the bytes it came from, and its fields in
/// schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: RecordType,
    span: ByteRange,
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    /// An empty record, for building new entities to insert into a graph.
    pub fn new(kind: RecordType) -> Self {
        Self {
            kind,
            span: ByteRange::default(),
            fields: Vec::new(),
        }
    }

    pub(crate) fn with_fields(
        kind: RecordType,
        span: ByteRange,
        fields: Vec<(&'static str, Value)>,
    ) -> Self {
        Self { kind, span, fields }
    }

    pub fn kind(&self) -> RecordType {
        self.kind
    }

    /// Source byte range; empty for records that were never decoded.
    pub fn span(&self) -> ByteRange {
        self.span
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Appends a field; used when assembling records by hand.
    pub fn push(mut self, name: &'static str, value: Value) -> Self {
        self.fields.push((name, value));
        self
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn record(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(Value::as_record)
    }

    pub fn record_mut(&mut self, name: &str) -> Option<&mut Record> {
        self.get_mut(name).and_then(Value::as_record_mut)
    }

    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn list_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.get_mut(name).and_then(Value::as_list_mut)
    }

    /// Records of a list field, skipping non-record elements.
    pub fn records<'s>(&'s self, name: &str) -> impl Iterator<Item = &'s Record> + use<'s> {
        self.list(name)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_record)
    }

    fn slot(&mut self, name: &str) -> Result<&mut Value> {
        let kind = self.kind;
        self.get_mut(name).ok_or_else(|| Error::MissingField {
            record: kind,
            field: name.to_string(),
        })
    }

    /// Replaces an integer field, keeping its declared width. Values that
    /// don't fit fail with a range error.
    pub fn set_int(&mut self, name: &str, value: i64) -> Result<()> {
        self.set_int_with(name, value, CastMode::Checked)
    }

    /// Like [`Record::set_int`] but masks the value to the field's width.
    pub fn set_int_masked(&mut self, name: &str, value: i64) -> Result<()> {
        self.set_int_with(name, value, CastMode::Wrapping)
    }

    fn set_int_with(&mut self, name: &str, value: i64, mode: CastMode) -> Result<()> {
        let slot = self.slot(name)?;
        let kind = match slot.scalar_kind() {
            Some(kind) if kind.is_integer() => kind,
            _ => {
                return Err(Error::TypeMismatch {
                    field: name.to_string(),
                    expected: "integer",
                    found: slot.type_name(),
                });
            }
        };
        *slot = kind.coerce(name, &Value::I64(value), mode)?;
        Ok(())
    }

    pub fn set_float(&mut self, name: &str, value: f64) -> Result<()> {
        let slot = self.slot(name)?;
        let next = match &*slot {
            Value::F32(_) => ScalarKind::F32.coerce(name, &Value::F64(value), CastMode::Wrapping)?,
            Value::F64(_) => Value::F64(value),
            other => {
                return Err(Error::TypeMismatch {
                    field: name.to_string(),
                    expected: "float",
                    found: other.type_name(),
                });
            }
        };
        *slot = next;
        Ok(())
    }

    pub fn set_str(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        match self.slot(name)? {
            Value::Str(s) => {
                *s = value.into();
                Ok(())
            }
            other => Err(Error::TypeMismatch {
                field: name.to_string(),
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// Replaces a field wholesale. The new value must have the same shape as
    /// the old one unless either of them is [`Value::Absent`].
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let slot = self.slot(name)?;
        if !slot.is_absent()
            && !value.is_absent()
            && std::mem::discriminant(&*slot) != std::mem::discriminant(&value)
        {
            return Err(Error::TypeMismatch {
                field: name.to_string(),
                expected: slot.type_name(),
                found: value.type_name(),
            });
        }
        *slot = value;
        Ok(())
    }
}
