//! Rust backend: serde structs and enums.
//!
//! Every struct field is an `Option` skipped when unset. String-only enums
//! derive serde with per-variant renames; enums mixing strings, booleans and
//! numbers get hand-written impls matching the raw JSON values. Flag lists
//! become a `<Name>Flag` enum plus a `<Name>` newtype serialized as the
//! `+`-joined string.
//!
//! Generated files `use super::*` and expect the enclosing module to provide
//! `Color`, `ColorList` and `ColorScale`, plus the other generated files.

use crate::ir::{
    Artifact, EnumDef, Field, FieldType, FlagListDef, Scalar, StructDef, TraceEntry, TypeFile,
};
use crate::naming::{escape_literal, field_ident};
use crate::schema::RawValue;
use crate::traits::{Backend, RenderError, RenderOptions};
use std::collections::BTreeMap;

/// Rust backend.
pub struct RustBackend;

/// Static instance for registry.
pub static RUST_BACKEND: RustBackend = RustBackend;

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn language(&self) -> &'static str {
        "rust"
    }

    fn extension(&self) -> &'static str {
        "rs"
    }

    fn render(&self, artifact: &Artifact, options: &RenderOptions) -> Result<String, RenderError> {
        render_rust(artifact, options)
    }

    fn validate(&self, source: &str) -> Result<(), String> {
        check_rust_syntax(source)
    }
}

/// Parse `source` as a Rust file.
pub fn check_rust_syntax(source: &str) -> Result<(), String> {
    syn::parse_file(source)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Render an artifact to Rust source.
pub fn render_rust(artifact: &Artifact, options: &RenderOptions) -> Result<String, RenderError> {
    let mut w = RustWriter::new();
    match artifact {
        Artifact::Trace { wire_name, file } => {
            check_type_file(file, true)?;
            w.header(options);
            w.trace_main(wire_name, &file.main);
            w.nested(file);
        }
        Artifact::Layout { file } | Artifact::Config { file } => {
            check_type_file(file, false)?;
            w.header(options);
            w.structure(&file.main);
            w.nested(file);
        }
        Artifact::Decoder { traces } => {
            check_traces(traces)?;
            w.header(options);
            w.decoder(traces);
        }
    }
    Ok(w.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Struct,
    Enum,
    Flags,
    FlagItem,
}

fn check_type_file(file: &TypeFile, trace: bool) -> Result<(), RenderError> {
    let mut declared = BTreeMap::new();
    let mut declare = |name: String, kind: Kind| {
        if name.is_empty() {
            return Err(RenderError::EmptyName("type"));
        }
        if declared.insert(name.clone(), kind).is_some() {
            return Err(RenderError::DuplicateType(name));
        }
        Ok(())
    };

    for def in file.structs() {
        declare(def.name.clone(), Kind::Struct)?;
    }
    for def in &file.enums {
        declare(def.name.clone(), Kind::Enum)?;
        if def.variants.is_empty() {
            return Err(RenderError::EmptyEnum(def.name.clone()));
        }
        check_unique(
            &def.name,
            def.variants.iter().map(|v| (v.value.literal(), v.name.clone())),
        )?;
    }
    for def in &file.flag_lists {
        declare(def.name.clone(), Kind::Flags)?;
        declare(flag_enum_name(def), Kind::FlagItem)?;
        if def.flags.is_empty() {
            return Err(RenderError::EmptyEnum(def.name.clone()));
        }
        check_unique(
            &def.name,
            def.flags.iter().map(|f| (f.value.clone(), f.name.clone())),
        )?;
    }

    for def in file.structs() {
        let is_trace_main = trace && def.name == file.main.name;
        for field in &def.fields {
            check_field_type(&declared, def, field, is_trace_main)?;
        }
        check_unique(
            &def.name,
            def.fields
                .iter()
                .map(|f| (f.json_name.clone(), field_ident(&f.json_name))),
        )?;
    }
    Ok(())
}

fn check_field_type(
    declared: &BTreeMap<String, Kind>,
    owner: &StructDef,
    field: &Field,
    is_trace_main: bool,
) -> Result<(), RenderError> {
    if field.name.is_empty() || field_ident(&field.json_name).is_empty() {
        return Err(RenderError::EmptyName("field"));
    }
    let expected = match &field.ty {
        FieldType::Scalar(_) => return Ok(()),
        FieldType::Discriminator if is_trace_main => return Ok(()),
        FieldType::Discriminator => {
            return Err(RenderError::MisplacedDiscriminator {
                owner: owner.name.clone(),
                field: field.name.clone(),
            });
        }
        FieldType::Object(name) | FieldType::List(name) => (name, Kind::Struct),
        FieldType::Enum(name) => (name, Kind::Enum),
        FieldType::Flags(name) => (name, Kind::Flags),
    };
    match declared.get(expected.0) {
        Some(kind) if *kind == expected.1 => Ok(()),
        _ => Err(RenderError::UndeclaredType {
            owner: owner.name.clone(),
            field: field.name.clone(),
            ty: expected.0.clone(),
        }),
    }
}

/// Every `(source, ident)` pair must have a distinct, non-empty ident.
fn check_unique(
    owner: &str,
    pairs: impl Iterator<Item = (String, String)>,
) -> Result<(), RenderError> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (source, ident) in pairs {
        if ident.is_empty() {
            return Err(RenderError::EmptyName("member"));
        }
        if let Some(first) = seen.get(&ident) {
            return Err(RenderError::DuplicateField {
                owner: owner.to_string(),
                first: first.clone(),
                second: source,
                ident,
            });
        }
        seen.insert(ident, source);
    }
    Ok(())
}

fn check_traces(traces: &[TraceEntry]) -> Result<(), RenderError> {
    if traces.is_empty() {
        return Err(RenderError::NoTraces);
    }
    for entry in traces {
        if entry.wire_name.is_empty() || entry.type_name.is_empty() {
            return Err(RenderError::EmptyName("trace"));
        }
    }
    check_unique(
        "TraceType",
        traces
            .iter()
            .map(|t| (t.wire_name.clone(), t.type_name.clone())),
    )
}

fn flag_enum_name(def: &FlagListDef) -> String {
    format!("{}Flag", def.name)
}

fn field_type(ty: &FieldType) -> String {
    match ty {
        FieldType::Scalar(scalar) => scalar_type(*scalar).to_string(),
        FieldType::Object(name) | FieldType::Enum(name) | FieldType::Flags(name) => name.clone(),
        FieldType::List(name) => format!("Vec<{}>", name),
        FieldType::Discriminator => "TraceType".to_string(),
    }
}

fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Float => "f64",
        Scalar::Integer => "i64",
        Scalar::Boolean => "bool",
        Scalar::String => "String",
        Scalar::Color => "Color",
        Scalar::ColorList => "ColorList",
        Scalar::ColorScale => "ColorScale",
        Scalar::Untyped => "serde_json::Value",
    }
}

/// `serde_json::Value` constructor expression for a raw value.
fn value_expr(value: &RawValue) -> String {
    format!("serde_json::Value::from({})", value_literal(value))
}

/// Literal comparable with a `serde_json::Value`.
fn value_literal(value: &RawValue) -> String {
    match value {
        RawValue::String(s) => format!("\"{}\"", escape_literal(s)),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                format!("{}i64", i)
            } else if let Some(u) = n.as_u64() {
                format!("{}u64", u)
            } else {
                format!("{:?}f64", n.as_f64().unwrap_or_default())
            }
        }
    }
}

struct RustWriter {
    out: String,
}

impl RustWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn docs(&mut self, depth: usize, docs: Option<&str>) {
        let Some(docs) = docs else { return };
        for line in docs.lines() {
            let line = line.replace('\r', " ");
            let line = line.trim_end();
            if line.is_empty() {
                self.line(depth, "///");
            } else {
                self.line(depth, &format!("/// {}", line));
            }
        }
    }

    fn header(&mut self, options: &RenderOptions) {
        self.line(
            0,
            &format!("// Code generated by {}. DO NOT EDIT.", options.generator),
        );
        self.blank();
        self.line(0, "use serde::{Deserialize, Serialize};");
        self.blank();
        self.line(0, "#[allow(unused_imports)]");
        self.line(0, "use super::*;");
    }

    fn nested(&mut self, file: &TypeFile) {
        for def in &file.objects {
            self.structure(def);
        }
        for def in &file.enums {
            self.enumeration(def);
        }
        for def in &file.flag_lists {
            self.flag_list(def);
        }
    }

    fn fields(&mut self, def: &StructDef) {
        for field in &def.fields {
            self.docs(1, field.docs.as_deref());
            let ident = field_ident(&field.json_name);
            let rename = escape_literal(&field.json_name);
            if field.ty == FieldType::Discriminator {
                self.line(1, &format!("#[serde(rename = \"{}\")]", rename));
                self.line(1, &format!("pub {}: TraceType,", ident));
            } else {
                self.line(
                    1,
                    &format!(
                        "#[serde(rename = \"{}\", skip_serializing_if = \"Option::is_none\")]",
                        rename
                    ),
                );
                self.line(
                    1,
                    &format!("pub {}: Option<{}>,", ident, field_type(&field.ty)),
                );
            }
        }
    }

    fn structure(&mut self, def: &StructDef) {
        self.blank();
        self.docs(0, def.docs.as_deref());
        self.line(
            0,
            "#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]",
        );
        self.line(0, &format!("pub struct {} {{", def.name));
        self.fields(def);
        self.line(0, "}");
    }

    /// Main type of a trace: the discriminator is pre-filled by `Default`.
    fn trace_main(&mut self, wire_name: &str, def: &StructDef) {
        let discriminator = def
            .fields
            .iter()
            .find(|f| f.ty == FieldType::Discriminator)
            .map(|f| field_ident(&f.json_name));

        self.blank();
        self.docs(0, def.docs.as_deref());
        self.line(0, "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]");
        self.line(0, &format!("pub struct {} {{", def.name));
        self.fields(def);
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl {} {{", def.name));
        self.line(
            1,
            &format!("/// Wire-level type tag, `\"{}\"`.", escape_literal(wire_name)),
        );
        self.line(
            1,
            &format!("pub const TRACE_TYPE: TraceType = TraceType::{};", def.name),
        );
        self.blank();
        self.line(1, "pub fn trace_type(&self) -> TraceType {");
        match &discriminator {
            Some(ident) => self.line(2, &format!("self.{}", ident)),
            None => self.line(2, "Self::TRACE_TYPE"),
        }
        self.line(1, "}");
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl Default for {} {{", def.name));
        self.line(1, "fn default() -> Self {");
        self.line(2, "Self {");
        for field in &def.fields {
            let ident = field_ident(&field.json_name);
            if field.ty == FieldType::Discriminator {
                self.line(3, &format!("{}: Self::TRACE_TYPE,", ident));
            } else {
                self.line(3, &format!("{}: None,", ident));
            }
        }
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");
    }

    fn enumeration(&mut self, def: &EnumDef) {
        let string_enum = def.is_string_enum();

        self.blank();
        self.docs(0, def.docs.as_deref());
        if string_enum {
            self.line(
                0,
                "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]",
            );
        } else {
            self.line(0, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
        }
        self.line(0, &format!("pub enum {} {{", def.name));
        for variant in &def.variants {
            if let (true, RawValue::String(raw)) = (string_enum, &variant.value) {
                self.line(1, &format!("#[serde(rename = \"{}\")]", escape_literal(raw)));
            }
            self.line(1, &format!("{},", variant.name));
        }
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl {} {{", def.name));
        self.line(1, "/// Raw schema value of this variant.");
        self.line(1, "pub fn as_value(&self) -> serde_json::Value {");
        self.line(2, "match self {");
        for variant in &def.variants {
            self.line(
                3,
                &format!("Self::{} => {},", variant.name, value_expr(&variant.value)),
            );
        }
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");

        if !string_enum {
            self.mixed_serde(def);
        }
    }

    /// Serde impls for an enum whose raw values are not all strings.
    fn mixed_serde(&mut self, def: &EnumDef) {
        self.blank();
        self.line(0, &format!("impl Serialize for {} {{", def.name));
        self.line(
            1,
            "fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {",
        );
        self.line(2, "self.as_value().serialize(serializer)");
        self.line(1, "}");
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl<'de> Deserialize<'de> for {} {{", def.name));
        self.line(
            1,
            "fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {",
        );
        self.line(2, "let value = serde_json::Value::deserialize(deserializer)?;");
        self.line(2, "match value {");
        for variant in &def.variants {
            self.line(
                3,
                &format!(
                    "ref v if *v == {} => Ok(Self::{}),",
                    value_literal(&variant.value),
                    variant.name
                ),
            );
        }
        self.line(
            3,
            &format!(
                "other => Err(serde::de::Error::custom(format!(\"unexpected {} value {{}}\", other))),",
                def.name
            ),
        );
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");
    }

    fn flag_list(&mut self, def: &FlagListDef) {
        let flag_enum = flag_enum_name(def);

        self.blank();
        self.line(0, &format!("/// A single flag of [`{}`].", def.name));
        self.line(
            0,
            "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]",
        );
        self.line(0, &format!("pub enum {} {{", flag_enum));
        for flag in &def.flags {
            self.line(1, &format!("#[serde(rename = \"{}\")]", escape_literal(&flag.value)));
            self.line(1, &format!("{},", flag.name));
        }
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl {} {{", flag_enum));
        self.line(1, "pub fn as_str(&self) -> &'static str {");
        self.line(2, "match self {");
        for flag in &def.flags {
            self.line(
                3,
                &format!("Self::{} => \"{}\",", flag.name, escape_literal(&flag.value)),
            );
        }
        self.line(2, "}");
        self.line(1, "}");
        self.blank();
        self.line(1, "/// Whether the flag must stand alone.");
        self.line(1, "pub fn is_exclusive(&self) -> bool {");
        let exclusive: Vec<_> = def
            .flags
            .iter()
            .filter(|f| f.exclusive)
            .map(|f| format!("Self::{}", f.name))
            .collect();
        if exclusive.is_empty() {
            self.line(2, "false");
        } else {
            self.line(2, &format!("matches!(self, {})", exclusive.join(" | ")));
        }
        self.line(1, "}");
        self.line(0, "}");

        self.blank();
        self.docs(0, def.docs.as_deref());
        self.line(0, "#[derive(Debug, Clone, Default, PartialEq, Eq)]");
        self.line(0, &format!("pub struct {}(pub Vec<{}>);", def.name, flag_enum));

        self.blank();
        self.line(0, &format!("impl {} {{", def.name));
        self.line(1, "pub fn new() -> Self {");
        self.line(2, "Self::default()");
        self.line(1, "}");
        self.blank();
        self.line(
            1,
            &format!("pub fn with(mut self, flag: {}) -> Self {{", flag_enum),
        );
        self.line(2, "if !self.0.contains(&flag) {");
        self.line(3, "self.0.push(flag);");
        self.line(2, "}");
        self.line(2, "self");
        self.line(1, "}");
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl std::fmt::Display for {} {{", def.name));
        self.line(
            1,
            "fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {",
        );
        self.line(2, "for (i, flag) in self.0.iter().enumerate() {");
        self.line(3, "if i > 0 {");
        self.line(4, "f.write_str(\"+\")?;");
        self.line(3, "}");
        self.line(3, "f.write_str(flag.as_str())?;");
        self.line(2, "}");
        self.line(2, "Ok(())");
        self.line(1, "}");
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl std::str::FromStr for {} {{", def.name));
        self.line(1, "type Err = String;");
        self.blank();
        self.line(1, "fn from_str(s: &str) -> Result<Self, Self::Err> {");
        self.line(2, "let mut flags = Vec::new();");
        self.line(2, "for part in s.split('+') {");
        self.line(3, "let flag = match part {");
        for flag in &def.flags {
            self.line(
                4,
                &format!(
                    "\"{}\" => {}::{},",
                    escape_literal(&flag.value),
                    flag_enum,
                    flag.name
                ),
            );
        }
        self.line(
            4,
            &format!(
                "other => return Err(format!(\"unknown {} flag `{{}}`\", other)),",
                def.name
            ),
        );
        self.line(3, "};");
        self.line(3, "flags.push(flag);");
        self.line(2, "}");
        self.line(2, "Ok(Self(flags))");
        self.line(1, "}");
        self.line(0, "}");

        self.blank();
        self.line(0, &format!("impl Serialize for {} {{", def.name));
        self.line(
            1,
            "fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {",
        );
        self.line(2, "serializer.collect_str(self)");
        self.line(1, "}");
        self.line(0, "}");

        // Boolean extras arrive as JSON booleans.
        self.blank();
        self.line(0, &format!("impl<'de> Deserialize<'de> for {} {{", def.name));
        self.line(
            1,
            "fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {",
        );
        self.line(2, "match serde_json::Value::deserialize(deserializer)? {");
        self.line(
            3,
            "serde_json::Value::String(s) => s.parse().map_err(serde::de::Error::custom),",
        );
        self.line(
            3,
            "serde_json::Value::Bool(b) => b.to_string().parse().map_err(serde::de::Error::custom),",
        );
        self.line(
            3,
            &format!(
                "other => Err(serde::de::Error::custom(format!(\"unexpected {} value {{}}\", other))),",
                def.name
            ),
        );
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");
    }

    fn decoder(&mut self, traces: &[TraceEntry]) {
        self.blank();
        self.line(0, "/// Wire-level type tag of a trace.");
        self.line(
            0,
            "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]",
        );
        self.line(0, "pub enum TraceType {");
        for entry in traces {
            self.line(
                1,
                &format!("#[serde(rename = \"{}\")]", escape_literal(&entry.wire_name)),
            );
            self.line(1, &format!("{},", entry.type_name));
        }
        self.line(0, "}");

        self.blank();
        self.line(0, "impl TraceType {");
        self.line(1, "/// Every trace type, ordered by type name.");
        self.line(1, "pub const ALL: &'static [TraceType] = &[");
        for entry in traces {
            self.line(2, &format!("TraceType::{},", entry.type_name));
        }
        self.line(1, "];");
        self.blank();
        self.line(1, "pub fn as_str(&self) -> &'static str {");
        self.line(2, "match self {");
        for entry in traces {
            self.line(
                3,
                &format!(
                    "Self::{} => \"{}\",",
                    entry.type_name,
                    escape_literal(&entry.wire_name)
                ),
            );
        }
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");

        self.blank();
        self.line(0, "/// Any trace, decoded by its `type` field.");
        self.line(0, "#[derive(Debug, Clone, PartialEq, Serialize)]");
        self.line(0, "#[serde(untagged)]");
        self.line(0, "pub enum Trace {");
        for entry in traces {
            self.line(1, &format!("{0}({0}),", entry.type_name));
        }
        self.line(0, "}");

        self.blank();
        self.line(0, "impl Trace {");
        self.line(1, "pub fn trace_type(&self) -> TraceType {");
        self.line(2, "match self {");
        for entry in traces {
            self.line(
                3,
                &format!("Self::{}(trace) => trace.trace_type(),", entry.type_name),
            );
        }
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");

        let wire_names: Vec<_> = traces
            .iter()
            .map(|t| format!("\"{}\"", escape_literal(&t.wire_name)))
            .collect();

        self.blank();
        self.line(0, "impl<'de> Deserialize<'de> for Trace {");
        self.line(
            1,
            "fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {",
        );
        self.line(2, "let value = serde_json::Value::deserialize(deserializer)?;");
        self.line(2, "let tag = value");
        self.line(3, ".get(\"type\")");
        self.line(3, ".and_then(serde_json::Value::as_str)");
        self.line(3, ".map(str::to_owned)");
        self.line(3, ".ok_or_else(|| serde::de::Error::missing_field(\"type\"))?;");
        self.line(2, "match tag.as_str() {");
        for entry in traces {
            self.line(
                3,
                &format!(
                    "\"{}\" => serde_json::from_value(value).map(Self::{}).map_err(serde::de::Error::custom),",
                    escape_literal(&entry.wire_name),
                    entry.type_name
                ),
            );
        }
        self.line(
            3,
            &format!(
                "other => Err(serde::de::Error::unknown_variant(other, &[{}])),",
                wire_names.join(", ")
            ),
        );
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");
    }
}
