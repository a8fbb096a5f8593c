//! Intermediate representation of a generated type graph.
//!
//! The builder produces these descriptors, the assembler orders them into a
//! [`TypeFile`], and backends render a [`TypeFile`] (wrapped in an
//! [`Artifact`]) to source text.

use crate::schema::RawValue;
use serde::Serialize;

/// Target-neutral scalar a leaf value type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scalar {
    Float,
    Integer,
    Boolean,
    String,
    Color,
    ColorList,
    ColorScale,
    /// Untyped container, able to hold arrays, objects or scalars.
    Untyped,
}

/// A field's type reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Scalar(Scalar),
    /// Reference to a generated struct.
    Object(String),
    /// List of a generated struct.
    List(String),
    /// Reference to a generated enum.
    Enum(String),
    /// Reference to a generated flag list.
    Flags(String),
    /// The trace discriminator.
    Discriminator,
}

impl FieldType {
    /// Name of the generated type this field refers to, if any.
    pub fn referenced(&self) -> Option<&str> {
        match self {
            Self::Object(name) | Self::List(name) | Self::Enum(name) | Self::Flags(name) => {
                Some(name)
            }
            Self::Scalar(_) | Self::Discriminator => None,
        }
    }
}

/// A field in a struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Target identifier.
    pub name: String,
    /// Original schema key; the wire name.
    pub json_name: String,
    pub ty: FieldType,
    pub docs: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, json_name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            json_name: json_name.into(),
            ty,
            docs: None,
        }
    }

    /// The `type` discriminator every trace carries.
    pub fn discriminator() -> Self {
        Self::new("Type", "type", FieldType::Discriminator).with_docs("is the type of the plot")
    }

    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }
}

/// A struct definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDef {
    pub name: String,
    pub docs: Option<String>,
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            fields: Vec::new(),
        }
    }

    pub fn with_docs(mut self, docs: Option<String>) -> Self {
        self.docs = docs;
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sort fields by identifier.
    pub fn sort_fields(&mut self) {
        self.fields.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// One enum variant: the synthesized identifier and the raw wire value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub name: String,
    pub value: RawValue,
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDef {
    pub name: String,
    pub docs: Option<String>,
    pub variants: Vec<Variant>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            variants: Vec::new(),
        }
    }

    pub fn variant(&self, value: &RawValue) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.value == value)
    }

    /// Whether every raw value is a string.
    pub fn is_string_enum(&self) -> bool {
        self.variants
            .iter()
            .all(|v| matches!(v.value, RawValue::String(_)))
    }
}

/// One flag of a flag list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flag {
    pub name: String,
    pub value: String,
    /// Extras such as `"none"` cannot be combined with other flags.
    pub exclusive: bool,
}

/// A flag-list definition: OR-combinable flags joined with `+` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagListDef {
    pub name: String,
    pub docs: Option<String>,
    pub flags: Vec<Flag>,
}

impl FlagListDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            flags: Vec::new(),
        }
    }
}

/// Everything generated for one target, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeFile {
    pub main: StructDef,
    pub objects: Vec<StructDef>,
    pub enums: Vec<EnumDef>,
    pub flag_lists: Vec<FlagListDef>,
}

impl TypeFile {
    pub fn object(&self, name: &str) -> Option<&StructDef> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn flag_list(&self, name: &str) -> Option<&FlagListDef> {
        self.flag_lists.iter().find(|f| f.name == name)
    }

    /// Main type followed by every nested struct.
    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        std::iter::once(&self.main).chain(self.objects.iter())
    }
}

/// A trace known to the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    /// Wire-level type tag (`"scatter"`).
    pub wire_name: String,
    /// Generated main type (`Scatter`).
    pub type_name: String,
}

/// One unit of generated output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Trace { wire_name: String, file: TypeFile },
    Layout { file: TypeFile },
    Config { file: TypeFile },
    Decoder { traces: Vec<TraceEntry> },
}

impl Artifact {
    /// Target label used in diagnostics.
    pub fn label(&self) -> &str {
        match self {
            Self::Trace { wire_name, .. } => wire_name,
            Self::Layout { .. } => "layout",
            Self::Config { .. } => "config",
            Self::Decoder { .. } => "decoder",
        }
    }

    pub fn type_file(&self) -> Option<&TypeFile> {
        match self {
            Self::Trace { file, .. } | Self::Layout { file } | Self::Config { file } => Some(file),
            Self::Decoder { .. } => None,
        }
    }
}
