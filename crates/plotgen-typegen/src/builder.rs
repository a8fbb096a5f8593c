//! Recursive attribute walker.
//!
//! [`TypeGraphBuilder::parse_attributes`] turns the attribute nodes of one
//! schema object into fields, synthesizing a named struct, enum or flag list
//! for every nested object, enumerated or flag-list attribute. Synthesized
//! types land in a flat [`TypeRegistry`] keyed by name; every registration
//! goes through the [`Merger`], so a name fed by several contributors is
//! merged rather than replaced.

use crate::assemble::{AxisFixup, assemble};
use crate::error::{GenerateError, Result};
use crate::ir::{EnumDef, Field, FieldType, Flag, FlagListDef, Scalar, StructDef, TypeFile, Variant};
use crate::merge::{ConflictPolicy, Merger};
use crate::naming::{Namer, SYMBOLS, SymbolTable};
use crate::schema::{AttrKind, Attribute, Attributes, RawValue, ValType};
use std::collections::BTreeMap;
use tracing::debug;

/// Mapping from leaf value types to target-neutral scalars.
#[derive(Debug)]
pub struct ScalarTable {
    entries: &'static [(ValType, Scalar)],
}

/// The value-type table used by default.
pub static SCALARS: ScalarTable = ScalarTable {
    entries: &[
        (ValType::Number, Scalar::Float),
        (ValType::Angle, Scalar::Float),
        (ValType::Integer, Scalar::Integer),
        (ValType::String, Scalar::String),
        (ValType::SubplotId, Scalar::String),
        (ValType::Color, Scalar::Color),
        (ValType::ColorList, Scalar::ColorList),
        (ValType::ColorScale, Scalar::ColorScale),
        (ValType::Boolean, Scalar::Boolean),
        (ValType::DataArray, Scalar::Untyped),
        (ValType::Any, Scalar::Untyped),
        (ValType::InfoArray, Scalar::Untyped),
    ],
};

impl ScalarTable {
    pub fn lookup(&self, val_type: ValType) -> Option<Scalar> {
        self.entries
            .iter()
            .find(|(v, _)| *v == val_type)
            .map(|(_, scalar)| *scalar)
    }
}

/// A synthesized declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Struct(StructDef),
    Enum(EnumDef),
    Flags(FlagListDef),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(def) => &def.name,
            Self::Enum(def) => &def.name,
            Self::Flags(def) => &def.name,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Struct(_) => "struct",
            Self::Enum(_) => "enum",
            Self::Flags(_) => "flag list",
        }
    }
}

/// Flat registry of synthesized declarations, keyed by name.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    decls: BTreeMap<String, Decl>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Decl> {
        self.decls.get(name)
    }

    /// Insert `decl`, merging with an existing declaration of the same name
    /// and kind. A name already declared as another kind is an error.
    pub fn register(&mut self, merger: &Merger, path: &str, decl: Decl) -> Result<()> {
        let Some(existing) = self.decls.get_mut(decl.name()) else {
            self.decls.insert(decl.name().to_string(), decl);
            return Ok(());
        };

        match (existing, decl) {
            (Decl::Struct(into), Decl::Struct(incoming)) => {
                merger.merge_struct(path, into, incoming)
            }
            (Decl::Enum(into), Decl::Enum(incoming)) => merger.merge_enum(path, into, incoming),
            (Decl::Flags(into), Decl::Flags(incoming)) => merger.merge_flags(path, into, incoming),
            (existing, incoming) => Err(GenerateError::TypeSynthesis {
                target: merger.target().to_string(),
                path: path.to_string(),
                reason: format!(
                    "`{}` is already declared as a {}, cannot redeclare it as a {}",
                    incoming.name(),
                    existing.kind(),
                    incoming.kind()
                ),
            }),
        }
    }

    /// Split into structs, enums and flag lists, each in name order.
    pub fn split(self) -> (Vec<StructDef>, Vec<EnumDef>, Vec<FlagListDef>) {
        let mut structs = Vec::new();
        let mut enums = Vec::new();
        let mut flags = Vec::new();
        for decl in self.decls.into_values() {
            match decl {
                Decl::Struct(def) => structs.push(def),
                Decl::Enum(def) => enums.push(def),
                Decl::Flags(def) => flags.push(def),
            }
        }
        (structs, enums, flags)
    }
}

/// Builds the type graph of one target.
#[derive(Debug)]
pub struct TypeGraphBuilder<'a> {
    scalars: &'a ScalarTable,
    namer: Namer<'a>,
    merger: Merger,
    types: TypeRegistry,
}

impl TypeGraphBuilder<'static> {
    /// Builder over the default value-type and symbol tables.
    pub fn new(target: impl Into<String>, policy: ConflictPolicy) -> Self {
        Self::with_tables(target, policy, &SCALARS, &SYMBOLS)
    }
}

impl<'a> TypeGraphBuilder<'a> {
    pub fn with_tables(
        target: impl Into<String>,
        policy: ConflictPolicy,
        scalars: &'a ScalarTable,
        symbols: &'a SymbolTable,
    ) -> Self {
        Self {
            scalars,
            namer: Namer::new(symbols),
            merger: Merger::new(target, policy),
            types: TypeRegistry::new(),
        }
    }

    pub fn target(&self) -> &str {
        self.merger.target()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Turn the attributes `names` of `node` into fields.
    ///
    /// `type_name` is the attribute path of the owning contributor, used in
    /// diagnostics only. `parent_name` prefixes every synthesized type name.
    pub fn parse_attributes<'n>(
        &mut self,
        type_name: &str,
        parent_name: &str,
        node: &Attributes,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for name in names {
            let path = format!("{}.{}", type_name, name);
            let attribute = node
                .get(name)
                .ok_or_else(|| GenerateError::SchemaResolution {
                    target: self.target().to_string(),
                    path: path.clone(),
                })?;
            let field = self.parse_attribute(&path, parent_name, name, attribute)?;
            self.merger.merge_fields(type_name, &mut fields, [field])?;
        }
        Ok(fields)
    }

    /// Fold `fields` into `main` under the first-wins policy.
    pub fn contribute(&self, owner: &str, main: &mut StructDef, fields: Vec<Field>) -> Result<()> {
        self.merger.merge_fields(owner, &mut main.fields, fields)
    }

    /// Hand the main type and every synthesized type to the assembler.
    pub fn finish(self, main: StructDef, axes: Option<&AxisFixup>) -> Result<TypeFile> {
        if let Some(decl) = self.types.get(&main.name) {
            return Err(GenerateError::TypeSynthesis {
                target: self.target().to_string(),
                path: main.name.clone(),
                reason: format!("main type collides with a nested {}", decl.kind()),
            });
        }
        assemble(self.merger.target(), main, self.types, axes)
    }

    fn parse_attribute(
        &mut self,
        path: &str,
        parent_name: &str,
        name: &str,
        attribute: &Attribute,
    ) -> Result<Field> {
        let ident = self.namer.type_ident(name);
        if ident.is_empty() {
            return Err(self.synthesis_error(path, "no identifier characters in attribute name"));
        }
        let type_name = format!("{}{}", parent_name, ident);

        let ty = match &attribute.kind {
            AttrKind::Scalar(val_type) => {
                let scalar = self.scalars.lookup(*val_type).ok_or_else(|| {
                    self.synthesis_error(
                        path,
                        &format!("no scalar mapping for valType `{}`", val_type.tag()),
                    )
                })?;
                FieldType::Scalar(scalar)
            }
            AttrKind::Object(children) => {
                let def = self.parse_object(path, &type_name, children, &attribute.description)?;
                self.register(path, Decl::Struct(def))?;
                FieldType::Object(type_name)
            }
            AttrKind::Array {
                item,
                docs,
                element,
            } => {
                let element_name = format!("{}{}", parent_name, self.namer.type_ident(item));
                let element_path = format!("{}.items.{}", path, item);
                let def = self.parse_object(&element_path, &element_name, element, docs)?;
                self.register(&element_path, Decl::Struct(def))?;
                FieldType::List(element_name)
            }
            AttrKind::Enumerated(values) => {
                if values.is_empty() {
                    return Err(self.synthesis_error(path, "enumerated attribute has no values"));
                }
                let def = self.parse_enum(path, &type_name, values, &attribute.description)?;
                self.register(path, Decl::Enum(def))?;
                FieldType::Enum(type_name)
            }
            AttrKind::FlagList { flags, extras } => {
                let mut candidate = FlagListDef::new(type_name.clone());
                candidate.docs = attribute.description.clone();
                let tagged = flags
                    .iter()
                    .map(|f| (f, false))
                    .chain(extras.iter().map(|e| (e, true)));
                for (value, exclusive) in tagged {
                    candidate.flags.push(Flag {
                        name: self.variant_ident(path, &RawValue::from(value.as_str()))?,
                        value: value.clone(),
                        exclusive,
                    });
                }
                if candidate.flags.is_empty() {
                    return Err(self.synthesis_error(path, "flag list has no flags"));
                }
                let mut def = FlagListDef::new(type_name.clone());
                self.merger.merge_flags(path, &mut def, candidate)?;
                self.register(path, Decl::Flags(def))?;
                FieldType::Flags(type_name)
            }
        };

        let mut field = Field::new(ident, name, ty);
        field.docs = attribute.description.clone();
        Ok(field)
    }

    fn parse_object(
        &mut self,
        path: &str,
        type_name: &str,
        children: &Attributes,
        docs: &Option<String>,
    ) -> Result<StructDef> {
        let mut def = StructDef::new(type_name).with_docs(docs.clone());
        def.fields = self.parse_attributes(path, type_name, children, children.names())?;
        Ok(def)
    }

    fn parse_enum(
        &self,
        path: &str,
        type_name: &str,
        values: &[RawValue],
        docs: &Option<String>,
    ) -> Result<EnumDef> {
        let mut candidate = EnumDef::new(type_name);
        candidate.docs = docs.clone();
        for value in values {
            candidate.variants.push(Variant {
                name: self.variant_ident(path, value)?,
                value: value.clone(),
            });
        }
        // Duplicates within one value list collapse like cross-contributor ones.
        let mut def = EnumDef::new(type_name);
        self.merger.merge_enum(path, &mut def, candidate)?;
        Ok(def)
    }

    fn register(&mut self, path: &str, decl: Decl) -> Result<()> {
        debug!(
            artifact = %self.target(),
            path,
            kind = decl.kind(),
            name = decl.name(),
            "synthesized type"
        );
        self.types.register(&self.merger, path, decl)
    }

    fn variant_ident(&self, path: &str, value: &RawValue) -> Result<String> {
        self.namer.variant_ident(&value.to_string()).ok_or_else(|| {
            let reason = format!("value {} has no identifier characters", value.literal());
            self.synthesis_error(path, &reason)
        })
    }

    fn synthesis_error(&self, path: &str, reason: &str) -> GenerateError {
        GenerateError::TypeSynthesis {
            target: self.target().to_string(),
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
