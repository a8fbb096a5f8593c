//! In-memory model of the chart attribute schema.
//!
//! The model is read-only once built. Input parsers (see [`crate::input`])
//! produce it; the type-graph builder only ever borrows it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Value-type tag of a leaf attribute.
///
/// Enumerated and flag-list leaves carry extra content and are modelled as
/// [`AttrKind`] variants instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValType {
    Number,
    Integer,
    String,
    Boolean,
    Color,
    ColorList,
    ColorScale,
    Angle,
    SubplotId,
    DataArray,
    Any,
    InfoArray,
}

impl ValType {
    /// Resolve a schema `valType` tag. Returns `None` for unknown tags and for
    /// the tags that are not plain leaves (`enumerated`, `flaglist`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "number" => Self::Number,
            "integer" => Self::Integer,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "color" => Self::Color,
            "colorlist" => Self::ColorList,
            "colorscale" => Self::ColorScale,
            "angle" => Self::Angle,
            "subplotid" => Self::SubplotId,
            "data_array" => Self::DataArray,
            "any" => Self::Any,
            "info_array" => Self::InfoArray,
            _ => return None,
        })
    }

    /// The schema tag for this value type.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Color => "color",
            Self::ColorList => "colorlist",
            Self::ColorScale => "colorscale",
            Self::Angle => "angle",
            Self::SubplotId => "subplotid",
            Self::DataArray => "data_array",
            Self::Any => "any",
            Self::InfoArray => "info_array",
        }
    }
}

/// A legal value of an enumerated attribute, with its JSON kind preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    String(String),
    Bool(bool),
    Number(serde_json::Number),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// `String`, `Number` or `Bool`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Number(_) => "Number",
            Self::Bool(_) => "Bool",
        }
    }

    /// JSON spelling of the value, so `"0"` and `0` stay distinguishable.
    pub fn literal(&self) -> String {
        match self {
            Self::String(s) => serde_json::Value::from(s.as_str()).to_string(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Shape of an attribute node.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrKind {
    /// Leaf with a plain value type.
    Scalar(ValType),
    /// Nested object with its own attributes.
    Object(Attributes),
    /// Container array (`items` holding a single object element).
    Array {
        /// Element name inside `items` (e.g. `annotation`).
        item: String,
        /// Element description.
        docs: Option<String>,
        /// Element attributes.
        element: Attributes,
    },
    /// Leaf restricted to a list of raw values.
    Enumerated(Vec<RawValue>),
    /// Leaf composed by `+`-joining flags; extras stand alone.
    FlagList {
        flags: Vec<String>,
        extras: Vec<String>,
    },
}

/// One attribute node.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub description: Option<String>,
    pub kind: AttrKind,
}

impl Attribute {
    pub fn scalar(val_type: ValType) -> Self {
        Self {
            description: None,
            kind: AttrKind::Scalar(val_type),
        }
    }

    pub fn object(attributes: Attributes) -> Self {
        Self {
            description: None,
            kind: AttrKind::Object(attributes),
        }
    }

    pub fn enumerated(values: impl IntoIterator<Item = RawValue>) -> Self {
        Self {
            description: None,
            kind: AttrKind::Enumerated(values.into_iter().collect()),
        }
    }

    pub fn flag_list(flags: &[&str], extras: &[&str]) -> Self {
        Self {
            description: None,
            kind: AttrKind::FlagList {
                flags: flags.iter().map(|f| f.to_string()).collect(),
                extras: extras.iter().map(|e| e.to_string()).collect(),
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Attribute nodes of one object, keyed by schema name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    nodes: BTreeMap<String, Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.nodes.insert(name.into(), attribute);
    }

    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.nodes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Schema of one trace type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSchema {
    /// Wire-level type tag (`"scatter"`).
    pub wire_name: String,
    pub description: Option<String>,
    pub attributes: Attributes,
    /// Attributes this trace contributes to the shared layout.
    pub layout_attributes: Attributes,
}

/// The whole schema: every trace, the layout and the config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub traces: BTreeMap<String, TraceSchema>,
    pub layout: Attributes,
    pub config: Attributes,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace(&self, name: &str) -> Option<&TraceSchema> {
        self.traces.get(name)
    }

    /// Trace names in lexicographic order.
    pub fn trace_names(&self) -> impl Iterator<Item = &str> {
        self.traces.keys().map(String::as_str)
    }

    pub fn add_trace(&mut self, name: impl Into<String>, trace: TraceSchema) {
        self.traces.insert(name.into(), trace);
    }
}
