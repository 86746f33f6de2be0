//! Schema-driven decode and encode of records.
//!
//! Decoding walks a record's layout once, front to back, consuming exactly
//! the bytes each field needs. Encoding walks the same layout over the
//! in-memory record and writes each field in layout order, so positions
//! follow the current values rather than the offsets they were read from.
//!
//! Counted arrays are asymmetric: on decode the count field decides how many
//! elements to read, on encode the in-memory list decides how many to write.
//! [`EncodeOptions::strict_counts`] turns a disagreement into an error.

use crate::cursor::{ByteSink, Cursor, Writer};
use crate::error::{Error, Result};
use crate::layout::ByteRange;
use crate::primitive::{CastMode, ScalarKind, read_scalar, write_scalar};
use crate::schema::version::{GameVersion, VersionSelector};
use crate::schema::{RecordType, SchemaNode, catalog};
use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub cast: CastMode,
    /// Fail with [`Error::LengthMismatch`] when a counted array's length
    /// differs from its count field.
    pub strict_counts: bool,
}

/// A counted array whose length disagrees with its count field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMismatch {
    pub record: RecordType,
    pub span: ByteRange,
    pub count_field: &'static str,
    pub array_field: &'static str,
    pub declared: i64,
    pub actual: usize,
}

/// Record codec bound to one game version.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'s> {
    selector: &'s VersionSelector,
    version: GameVersion,
}

impl Codec<'static> {
    /// Codec over the built-in catalog.
    pub fn standard(version: GameVersion) -> Self {
        Self::new(catalog::standard(), version)
    }
}

impl<'s> Codec<'s> {
    pub fn new(selector: &'s VersionSelector, version: GameVersion) -> Self {
        Self { selector, version }
    }

    pub fn version(&self) -> GameVersion {
        self.version
    }

    pub fn selector(&self) -> &'s VersionSelector {
        self.selector
    }

    pub fn decode_record(&self, c: &mut Cursor<'_>, kind: RecordType) -> Result<Record> {
        let layout = self.selector.select(kind, self.version)?;
        let start = c.position();
        let mut fields: Vec<(&'static str, Value)> = Vec::with_capacity(layout.fields.len());
        for def in &layout.fields {
            let offset = c.position();
            let value = self.decode_node(c, kind, &fields, &def.node)?;
            if let Some(expected) = def.expect
                && value.as_i64() != Some(expected)
            {
                return Err(Error::invalid(
                    offset,
                    format!("{kind}.{} must be {expected}, found {value:?}", def.name),
                ));
            }
            fields.push((def.name, value));
        }
        Ok(Record::with_fields(kind, ByteRange::new(start, c.position()), fields))
    }

    fn decode_node(
        &self,
        c: &mut Cursor<'_>,
        kind: RecordType,
        fields: &[(&'static str, Value)],
        node: &SchemaNode,
    ) -> Result<Value> {
        match node {
            SchemaNode::Scalar(scalar) => read_scalar(c, *scalar),
            SchemaNode::Record(nested) => Ok(Value::Record(self.decode_record(c, *nested)?)),
            SchemaNode::FixedArray { element, count } => {
                self.decode_elements(c, kind, fields, element, *count)
            }
            SchemaNode::CountedArray {
                element,
                count_field,
            } => {
                let offset = c.position();
                let declared = sibling_int(kind, fields, count_field)?;
                let count = usize::try_from(declared).map_err(|_| {
                    Error::invalid(offset, format!("negative count {declared} in `{count_field}`"))
                })?;
                self.decode_elements(c, kind, fields, element, count)
            }
            SchemaNode::Optional { gate, inner } => {
                let flag = sibling_int(kind, fields, gate.flag_field)?;
                if gate.is_open(flag) {
                    self.decode_node(c, kind, fields, inner)
                } else {
                    Ok(Value::Absent)
                }
            }
        }
    }

    fn decode_elements(
        &self,
        c: &mut Cursor<'_>,
        kind: RecordType,
        fields: &[(&'static str, Value)],
        element: &SchemaNode,
        count: usize,
    ) -> Result<Value> {
        if *element == SchemaNode::Scalar(ScalarKind::U8) {
            return Ok(Value::Bytes(c.read_bytes(count)?));
        }
        // A corrupt count must not drive a huge allocation.
        let mut items = Vec::with_capacity(count.min(c.remaining()));
        for _ in 0..count {
            items.push(self.decode_node(c, kind, fields, element)?);
        }
        Ok(Value::List(items))
    }

    pub fn encode_record<S: ByteSink>(
        &self,
        w: &mut Writer<S>,
        record: &Record,
        options: &EncodeOptions,
    ) -> Result<()> {
        let layout = self.selector.select(record.kind(), self.version)?;
        for def in &layout.fields {
            let value = record.get(def.name);
            if let Some(expected) = def.expect {
                let found = value.and_then(Value::as_i64);
                if found != Some(expected) {
                    return Err(Error::invalid(
                        w.position(),
                        format!(
                            "{}.{} must be {expected}, found {found:?}",
                            record.kind(),
                            def.name
                        ),
                    ));
                }
            }
            self.encode_node(w, record, def.name, &def.node, value, options)?;
        }
        Ok(())
    }

    fn encode_node<S: ByteSink>(
        &self,
        w: &mut Writer<S>,
        record: &Record,
        name: &'static str,
        node: &SchemaNode,
        value: Option<&Value>,
        options: &EncodeOptions,
    ) -> Result<()> {
        match node {
            SchemaNode::Scalar(kind) => {
                let value = required(record, name, value)?;
                let cast = kind.coerce(name, value, options.cast)?;
                write_scalar(w, name, *kind, &cast)
            }
            SchemaNode::Record(kind) => match required(record, name, value)? {
                Value::Record(nested) if nested.kind() == *kind => {
                    self.encode_record(w, nested, options)
                }
                Value::Record(nested) => Err(Error::TypeMismatch {
                    field: name.to_string(),
                    expected: kind.name(),
                    found: nested.kind().name(),
                }),
                other => Err(Error::TypeMismatch {
                    field: name.to_string(),
                    expected: kind.name(),
                    found: other.type_name(),
                }),
            },
            SchemaNode::FixedArray { element, count } => {
                let value = required(record, name, value)?;
                let actual = value.element_count().unwrap_or(0);
                if value.element_count() != Some(*count) {
                    return Err(Error::LengthMismatch {
                        field: name.to_string(),
                        expected: *count,
                        actual,
                    });
                }
                self.encode_elements(w, record, name, element, value, options)
            }
            SchemaNode::CountedArray {
                element,
                count_field,
            } => {
                let value = required(record, name, value)?;
                if options.strict_counts {
                    let declared = self.written_int(record, count_field, options.cast)?;
                    let actual = value.element_count().unwrap_or(0);
                    if usize::try_from(declared).ok() != Some(actual) {
                        return Err(Error::LengthMismatch {
                            field: name.to_string(),
                            expected: usize::try_from(declared).unwrap_or(0),
                            actual,
                        });
                    }
                }
                self.encode_elements(w, record, name, element, value, options)
            }
            SchemaNode::Optional { gate, inner } => {
                let flag = self.written_int(record, gate.flag_field, options.cast)?;
                if gate.is_open(flag) {
                    self.encode_node(w, record, name, inner, value, options)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Integer field `name` as the encoder writes it, after the cast.
    fn written_int(&self, record: &Record, name: &str, cast: CastMode) -> Result<i64> {
        let layout = self.selector.select(record.kind(), self.version)?;
        let kind = layout.fields.iter().find_map(|def| match def.node {
            SchemaNode::Scalar(kind) if def.name == name => Some(kind),
            _ => None,
        });
        let Some(kind) = kind else {
            return record_int(record, name);
        };
        let value = record.get(name).ok_or_else(|| Error::MissingField {
            record: record.kind(),
            field: name.to_string(),
        })?;
        let cast = kind.coerce(name, value, cast)?;
        cast.as_i64().ok_or_else(|| Error::TypeMismatch {
            field: name.to_string(),
            expected: "integer",
            found: cast.type_name(),
        })
    }

    fn encode_elements<S: ByteSink>(
        &self,
        w: &mut Writer<S>,
        record: &Record,
        name: &'static str,
        element: &SchemaNode,
        value: &Value,
        options: &EncodeOptions,
    ) -> Result<()> {
        match value {
            Value::Bytes(bytes) if *element == SchemaNode::Scalar(ScalarKind::U8) => {
                w.write_bytes(bytes);
                Ok(())
            }
            Value::List(items) => {
                for item in items {
                    self.encode_node(w, record, name, element, Some(item), options)?;
                }
                Ok(())
            }
            other => Err(Error::TypeMismatch {
                field: name.to_string(),
                expected: "list",
                found: other.type_name(),
            }),
        }
    }

    /// Every counted array in `record` and below whose length differs from
    /// its count field.
    pub fn check_counts(&self, record: &Record) -> Result<Vec<CountMismatch>> {
        let mut found = Vec::new();
        self.collect_mismatches(record, &mut found)?;
        Ok(found)
    }

    fn collect_mismatches(&self, record: &Record, out: &mut Vec<CountMismatch>) -> Result<()> {
        let layout = self.selector.select(record.kind(), self.version)?;
        for def in &layout.fields {
            let Some(value) = record.get(def.name) else {
                continue;
            };
            if let SchemaNode::CountedArray { count_field, .. } = def.node {
                let declared = record_int(record, count_field)?;
                let actual = value.element_count().unwrap_or(0);
                if usize::try_from(declared).ok() != Some(actual) {
                    out.push(CountMismatch {
                        record: record.kind(),
                        span: record.span(),
                        count_field,
                        array_field: def.name,
                        declared,
                        actual,
                    });
                }
            }
            self.collect_nested(value, out)?;
        }
        Ok(())
    }

    fn collect_nested(&self, value: &Value, out: &mut Vec<CountMismatch>) -> Result<()> {
        match value {
            Value::Record(nested) => self.collect_mismatches(nested, out),
            Value::List(items) => items
                .iter()
                .try_for_each(|item| self.collect_nested(item, out)),
            _ => Ok(()),
        }
    }
}

fn sibling_int(kind: RecordType, fields: &[(&'static str, Value)], name: &str) -> Result<i64> {
    let value = fields
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
        .ok_or_else(|| Error::MissingField {
            record: kind,
            field: name.to_string(),
        })?;
    value.as_i64().ok_or_else(|| Error::TypeMismatch {
        field: name.to_string(),
        expected: "integer",
        found: value.type_name(),
    })
}

fn record_int(record: &Record, name: &str) -> Result<i64> {
    let value = record.get(name).ok_or_else(|| Error::MissingField {
        record: record.kind(),
        field: name.to_string(),
    })?;
    value.as_i64().ok_or_else(|| Error::TypeMismatch {
        field: name.to_string(),
        expected: "integer",
        found: value.type_name(),
    })
}

fn required<'v>(record: &Record, name: &str, value: Option<&'v Value>) -> Result<&'v Value> {
    match value {
        Some(value) if !value.is_absent() => Ok(value),
        _ => Err(Error::MissingField {
            record: record.kind(),
            field: name.to_string(),
        }),
    }
}

/// Decodes one `kind` record from the start of `bytes` with the built-in
/// catalog. Bytes after the record are ignored; see [`Record::span`].
pub fn decode_record(kind: RecordType, bytes: &[u8], version: GameVersion) -> Result<Record> {
    Codec::standard(version).decode_record(&mut Cursor::new(bytes), kind)
}

/// Encodes one record with the built-in catalog.
pub fn encode_record(record: &Record, version: GameVersion, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    Codec::standard(version).encode_record(&mut w, record, options)?;
    Ok(w.into_inner())
}
