//! Mapping entries: immutable, typed resolution rules.
//!
//! Each entry is stored under a normalized path template in its schema's
//! registry. Rules that build on other rules (offsets, slices, expressions,
//! probes) name them by key instead of holding them, so a registry is an
//! arena addressed by key and rule graphs never own each other.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

use crate::{DataType, Expression};

/// Closed set of rule kinds, as named by the `type` field of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MappingKind {
    Value,
    Plugin,
    Dim,
    Slice,
    Expr,
    Custom,
    Offset,
}

impl MappingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingKind::Value => "VALUE",
            MappingKind::Plugin => "PLUGIN",
            MappingKind::Dim => "DIM",
            MappingKind::Slice => "SLICE",
            MappingKind::Expr => "EXPR",
            MappingKind::Custom => "CUSTOM",
            MappingKind::Offset => "OFFSET",
        }
    }
}

impl FromStr for MappingKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "VALUE" => Ok(MappingKind::Value),
            "PLUGIN" => Ok(MappingKind::Plugin),
            "DIM" | "DIMENSION" => Ok(MappingKind::Dim),
            "SLICE" => Ok(MappingKind::Slice),
            "EXPR" | "EXPRESSION" => Ok(MappingKind::Expr),
            "CUSTOM" => Ok(MappingKind::Custom),
            "OFFSET" => Ok(MappingKind::Offset),
            other => Err(format!("unknown mapping type '{other}'")),
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolution rule stored under `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    key: String,
    kind: EntryKind,
}

impl MappingEntry {
    pub fn new(key: impl Into<String>, kind: EntryKind) -> Self {
        Self { key: key.into(), kind }
    }

    /// Normalized path template the entry is registered under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn mapping_kind(&self) -> MappingKind {
        self.kind.mapping_kind()
    }

    /// The single entry this one wraps, if any.
    pub fn variable_reference(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Offset(rule) => Some(rule.variable.as_str()),
            EntryKind::Slice(rule) => Some(rule.variable.as_str()),
            EntryKind::Custom(rule) => rule.variable.as_deref(),
            EntryKind::Dim(DimRule {
                axis: DimAxis::Probe(probe), ..
            }) => Some(probe.as_str()),
            EntryKind::Dim(_) | EntryKind::Value(_) | EntryKind::Plugin(_) | EntryKind::Expr(_) => None,
        }
    }

    /// Every entry key this rule reads during resolution.
    pub fn references(&self) -> Vec<&str> {
        match &self.kind {
            EntryKind::Expr(rule) => rule
                .parameters
                .values()
                .filter_map(|operand| match operand {
                    ExprOperand::Reference(key) => Some(key.as_str()),
                    ExprOperand::Literal(_) => None,
                })
                .collect(),
            _ => self.variable_reference().into_iter().collect(),
        }
    }
}

/// Kind-specific rule parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    Value(ValueRule),
    Plugin(PluginRule),
    Dim(DimRule),
    Slice(SliceRule),
    Expr(ExprRule),
    Custom(CustomRule),
    Offset(OffsetRule),
}

impl EntryKind {
    pub fn mapping_kind(&self) -> MappingKind {
        match self {
            EntryKind::Value(_) => MappingKind::Value,
            EntryKind::Plugin(_) => MappingKind::Plugin,
            EntryKind::Dim(_) => MappingKind::Dim,
            EntryKind::Slice(_) => MappingKind::Slice,
            EntryKind::Expr(_) => MappingKind::Expr,
            EntryKind::Custom(_) => MappingKind::Custom,
            EntryKind::Offset(_) => MappingKind::Offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    /// Constant embedded in the rule.
    Literal(Value),
    /// Dot path into the schema's global attributes.
    Global(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueRule {
    pub source: ValueSource,
    pub dtype: Option<DataType>,
}

/// Delegation to an external signal accessor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginRule {
    pub plugin: String,
    #[serde(default)]
    pub function: Option<String>,
    /// Arguments passed to the accessor; string values may contain
    /// `{{ name }}` templates rendered at resolution time.
    #[serde(default)]
    pub args: JsonMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DimAxis {
    /// `start + i * step` for `i` in `0..count`.
    Range { count: usize, start: f64, step: f64 },
    /// Enumerated coordinates.
    Values(Vec<f64>),
    /// Element count of another entry's value.
    Probe(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimRule {
    pub axis: DimAxis,
    pub dtype: Option<DataType>,
}

/// One bound of a slice selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceBound {
    /// Literal position; negative values count from the end.
    Literal(i64),
    /// `#`: the next caller-supplied index, left to right.
    Placeholder,
}

/// Python-style selector: `i`, `start:stop` or `start:stop:step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceSelector {
    Index(SliceBound),
    Range {
        start: Option<SliceBound>,
        stop: Option<SliceBound>,
        step: usize,
    },
}

impl SliceSelector {
    pub fn parse(text: &str) -> Result<Self, String> {
        let parts: Vec<&str> = text.trim().trim_start_matches('[').trim_end_matches(']').split(':').collect();
        match parts.as_slice() {
            [single] => parse_bound(single)?
                .map(SliceSelector::Index)
                .ok_or_else(|| "slice selector is empty".to_string()),
            [start, stop] => Ok(SliceSelector::Range {
                start: parse_bound(start)?,
                stop: parse_bound(stop)?,
                step: 1,
            }),
            [start, stop, step] => {
                let step = match step.trim() {
                    "" => 1,
                    literal => literal
                        .parse::<usize>()
                        .map_err(|_| format!("slice step '{literal}' must be a positive integer"))?,
                };
                if step == 0 {
                    return Err("slice step cannot be zero".to_string());
                }
                Ok(SliceSelector::Range {
                    start: parse_bound(start)?,
                    stop: parse_bound(stop)?,
                    step,
                })
            }
            _ => Err(format!("slice selector '{}' has too many ':' separators", text.trim())),
        }
    }

    /// Number of caller indices the selector consumes.
    pub fn placeholder_count(&self) -> usize {
        let bounds: [Option<SliceBound>; 2] = match self {
            SliceSelector::Index(bound) => [Some(*bound), None],
            SliceSelector::Range { start, stop, .. } => [*start, *stop],
        };
        bounds.iter().flatten().filter(|bound| **bound == SliceBound::Placeholder).count()
    }
}

fn parse_bound(text: &str) -> Result<Option<SliceBound>, String> {
    match text.trim() {
        "" => Ok(None),
        "#" => Ok(Some(SliceBound::Placeholder)),
        literal => literal
            .parse::<i64>()
            .map(|value| Some(SliceBound::Literal(value)))
            .map_err(|_| format!("slice bound '{literal}' is neither an integer nor '#'")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceRule {
    pub variable: String,
    pub selector: SliceSelector,
}

/// Operand bound to an expression variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExprOperand {
    Literal(f64),
    Reference(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprRule {
    pub expression: Expression,
    pub parameters: IndexMap<String, ExprOperand>,
}

/// Named hook for behaviour the other kinds cannot express.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRule {
    pub name: String,
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub parameters: JsonMap<String, Value>,
}

/// Adds `offset` to every element of the entry stored under `variable`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OffsetRule {
    pub variable: String,
    pub offset: f64,
}
