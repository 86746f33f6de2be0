//! Field layouts for every record type in a save.
//!
//! A [`Layout`] is an ordered list of [`FieldDef`]s. Fields never own each
//! other's values: a counted array or an optional field names an *earlier*
//! field of the same record and reads its value at run time.

pub mod catalog;
pub mod version;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::primitive::ScalarKind;
use version::GameVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    Account,
    GameData,
    GameDesc,
    GameHistory,
    TechState,
    Player,
    Mecha,
    PlanetFactory,
    PlanetData,
    VeinData,
    EntityData,
    Belt,
    DigitalSystem,
}

impl RecordType {
    pub const ALL: [RecordType; 13] = [
        Self::Account,
        Self::GameData,
        Self::GameDesc,
        Self::GameHistory,
        Self::TechState,
        Self::Player,
        Self::Mecha,
        Self::PlanetFactory,
        Self::PlanetData,
        Self::VeinData,
        Self::EntityData,
        Self::Belt,
        Self::DigitalSystem,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Account => "AccountData",
            Self::GameData => "GameData",
            Self::GameDesc => "GameDesc",
            Self::GameHistory => "GameHistoryData",
            Self::TechState => "TechState",
            Self::Player => "Player",
            Self::Mecha => "Mecha",
            Self::PlanetFactory => "PlanetFactory",
            Self::PlanetData => "PlanetData",
            Self::VeinData => "VeinData",
            Self::EntityData => "EntityData",
            Self::Belt => "BeltComponent",
            Self::DigitalSystem => "DigitalSystem",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    NotEquals,
    AtLeast,
    Below,
}

/// Presence test for an optional field: `flag <cmp> value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub flag_field: &'static str,
    pub comparison: Comparison,
    pub value: i64,
}

impl Gate {
    pub fn equals(flag_field: &'static str, value: i64) -> Self {
        Self {
            flag_field,
            comparison: Comparison::Equals,
            value,
        }
    }

    pub fn not_equals(flag_field: &'static str, value: i64) -> Self {
        Self {
            flag_field,
            comparison: Comparison::NotEquals,
            value,
        }
    }

    pub fn at_least(flag_field: &'static str, value: i64) -> Self {
        Self {
            flag_field,
            comparison: Comparison::AtLeast,
            value,
        }
    }

    pub fn below(flag_field: &'static str, value: i64) -> Self {
        Self {
            flag_field,
            comparison: Comparison::Below,
            value,
        }
    }

    pub fn is_open(&self, flag: i64) -> bool {
        match self.comparison {
            Comparison::Equals => flag == self.value,
            Comparison::NotEquals => flag != self.value,
            Comparison::AtLeast => flag >= self.value,
            Comparison::Below => flag < self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Scalar(ScalarKind),
    Record(RecordType),
    FixedArray {
        element: Box<SchemaNode>,
        count: usize,
    },
    CountedArray {
        element: Box<SchemaNode>,
        count_field: &'static str,
    },
    Optional {
        gate: Gate,
        inner: Box<SchemaNode>,
    },
}

impl SchemaNode {
    pub fn fixed(element: SchemaNode, count: usize) -> Self {
        Self::FixedArray {
            element: Box::new(element),
            count,
        }
    }

    pub fn counted(element: SchemaNode, count_field: &'static str) -> Self {
        Self::CountedArray {
            element: Box::new(element),
            count_field,
        }
    }

    pub fn optional(gate: Gate, inner: SchemaNode) -> Self {
        Self::Optional {
            gate,
            inner: Box::new(inner),
        }
    }

    /// Encoded width when it does not depend on the value.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Scalar(kind) => kind.width(),
            Self::FixedArray { element, count } => element.fixed_width().map(|w| w * count),
            Self::Record(_) | Self::CountedArray { .. } | Self::Optional { .. } => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Scalar(kind) => kind.name().to_string(),
            Self::Record(kind) => kind.name().to_string(),
            Self::FixedArray { element, count } => format!("{}[{count}]", element.describe()),
            Self::CountedArray {
                element,
                count_field,
            } => format!("{}[{count_field}]", element.describe()),
            Self::Optional { gate, inner } => {
                format!("{} if ({} {:?} {})", inner.describe(), gate.flag_field, gate.comparison, gate.value)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub node: SchemaNode,
    /// Constant the decoded integer must equal.
    pub expect: Option<i64>,
}

impl fmt::Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.node.describe(), self.name)?;
        if let Some(expect) = self.expect {
            write!(f, " = {expect}")?;
        }
        Ok(())
    }
}

/// The field list a record type uses from `since` onward.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub record: RecordType,
    pub since: GameVersion,
    pub fields: Vec<FieldDef>,
}

impl Layout {
    pub fn new(record: RecordType, since: GameVersion) -> Self {
        Self {
            record,
            since,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &'static str, node: SchemaNode) -> Self {
        self.fields.push(FieldDef {
            name,
            node,
            expect: None,
        });
        self
    }

    pub fn scalar(self, name: &'static str, kind: ScalarKind) -> Self {
        self.field(name, SchemaNode::Scalar(kind))
    }

    pub fn record(self, name: &'static str, kind: RecordType) -> Self {
        self.field(name, SchemaNode::Record(kind))
    }

    /// Integer field that must decode to `value`.
    pub fn constant(mut self, name: &'static str, kind: ScalarKind, value: i64) -> Self {
        self.fields.push(FieldDef {
            name,
            node: SchemaNode::Scalar(kind),
            expect: Some(value),
        });
        self
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Checks that every counted array and gate names an earlier integer
    /// field, and that field names are unique.
    pub fn validate(&self) -> Result<()> {
        for (index, field) in self.fields.iter().enumerate() {
            if self.fields[..index].iter().any(|f| f.name == field.name) {
                return Err(self.schema_error(format!("duplicate field `{}`", field.name)));
            }
            if field.expect.is_some() && !is_integer_scalar(&field.node) {
                return Err(self.schema_error(format!("`{}` asserts a non-integer", field.name)));
            }
            self.validate_node(index, field.name, &field.node)?;
        }
        Ok(())
    }

    fn validate_node(&self, index: usize, name: &str, node: &SchemaNode) -> Result<()> {
        match node {
            SchemaNode::Scalar(_) | SchemaNode::Record(_) => Ok(()),
            SchemaNode::FixedArray { element, .. } => self.validate_node(index, name, element),
            SchemaNode::CountedArray {
                element,
                count_field,
            } => {
                self.require_earlier_integer(index, name, count_field)?;
                self.validate_node(index, name, element)
            }
            SchemaNode::Optional { gate, inner } => {
                self.require_earlier_integer(index, name, gate.flag_field)?;
                self.validate_node(index, name, inner)
            }
        }
    }

    fn require_earlier_integer(&self, index: usize, name: &str, reference: &str) -> Result<()> {
        match self.fields[..index].iter().find(|f| f.name == reference) {
            Some(f) if is_integer_scalar(&f.node) => Ok(()),
            Some(_) => Err(self.schema_error(format!(
                "`{name}` refers to `{reference}`, which is not an integer"
            ))),
            None => Err(self.schema_error(format!(
                "`{name}` refers to `{reference}`, which is not an earlier field"
            ))),
        }
    }

    fn schema_error(&self, message: String) -> Error {
        Error::InvalidSchema(format!("{} (since {}): {message}", self.record, self.since))
    }
}

fn is_integer_scalar(node: &SchemaNode) -> bool {
    matches!(node, SchemaNode::Scalar(kind) if kind.is_integer())
}

#[cfg(test)]
mod tests {
    use super::version::GameVersion;
    use super::{Gate, Layout, RecordType, SchemaNode};
    use crate::error::ErrorKind;
    use crate::primitive::ScalarKind;

    #[test]
    fn gate_comparisons() {
        assert!(Gate::equals("f", 1).is_open(1));
        assert!(!Gate::equals("f", 1).is_open(0));
        assert!(Gate::not_equals("f", -1).is_open(4));
        assert!(Gate::at_least("v", 6).is_open(7));
        assert!(Gate::below("v", 6).is_open(5));
        assert!(!Gate::below("v", 6).is_open(6));
    }

    #[test]
    fn counted_array_must_follow_its_count() {
        let layout = Layout::new(RecordType::GameDesc, GameVersion::new(0, 8, 0, 0))
            .field("ids", SchemaNode::counted(SchemaNode::Scalar(ScalarKind::I32), "n"))
            .scalar("n", ScalarKind::I32);
        let err = layout.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
        assert!(err.to_string().contains("not an earlier field"));
    }

    #[test]
    fn gate_flag_must_be_integer() {
        let layout = Layout::new(RecordType::PlanetFactory, GameVersion::new(0, 8, 0, 0))
            .scalar("flag", ScalarKind::F32)
            .field(
                "extra",
                SchemaNode::optional(Gate::equals("flag", 1), SchemaNode::Scalar(ScalarKind::I32)),
            );
        assert!(layout.validate().is_err());
    }

    #[test]
    fn fixed_width_sums_array_elements() {
        let pos = SchemaNode::fixed(SchemaNode::Scalar(ScalarKind::F32), 3);
        assert_eq!(pos.fixed_width(), Some(12));
        assert_eq!(SchemaNode::Record(RecordType::Belt).fixed_width(), None);
    }

    #[test]
    fn field_display_reads_like_a_declaration() {
        let layout = Layout::new(RecordType::GameDesc, GameVersion::new(0, 8, 0, 0))
            .scalar("theme_count", ScalarKind::I32)
            .field(
                "theme_ids",
                SchemaNode::counted(SchemaNode::Scalar(ScalarKind::I32), "theme_count"),
            )
            .constant("version", ScalarKind::I32, 0);
        assert_eq!(layout.fields[1].to_string(), "i32[theme_count] theme_ids");
        assert_eq!(layout.fields[2].to_string(), "i32 version = 0");
    }
}
