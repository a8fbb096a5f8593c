//! `plot-schema.json` to [`Schema`] parser.
//!
//! Layout of the document:
//!
//! ```text
//! traces.<name>.type              wire-level type tag
//! traces.<name>.meta.description  trace description
//! traces.<name>.attributes        attribute tree
//! traces.<name>.layoutAttributes  layout contribution
//! layout.layoutAttributes         layout attribute tree
//! config                          config attribute tree
//! ```
//!
//! Inside an attribute tree, a JSON object with a string `valType` is a leaf
//! and any other JSON object is a nested object. Non-object members
//! (`editType`, `role`, `description`, ...) are metadata, and keys starting
//! with `_` are internal to the charting library.

use crate::schema::{AttrKind, Attribute, Attributes, RawValue, Schema, TraceSchema, ValType};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Object-valued members that are metadata, not attributes.
const METADATA_KEYS: &[&str] = &["impliedEdits"];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("cannot read schema {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing `{0}` section")]
    MissingSection(&'static str),

    #[error("{path}: unknown valType `{tag}`")]
    UnknownValType { path: String, tag: String },

    #[error("{path}: {message}")]
    Malformed { path: String, message: String },
}

/// Read and parse a `plot-schema.json` file.
pub fn load_plot_schema(path: &Path) -> Result<Schema, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json: Value = serde_json::from_str(&content)?;
    parse_plot_schema(&json)
}

/// Parse a `plot-schema.json` document into a [`Schema`].
pub fn parse_plot_schema(input: &Value) -> Result<Schema, SchemaError> {
    let traces_json = input
        .get("traces")
        .and_then(Value::as_object)
        .ok_or(SchemaError::MissingSection("traces"))?;

    let mut traces = BTreeMap::new();
    for (name, trace) in traces_json {
        let path = format!("traces.{}", name);
        let wire_name = trace
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string();
        let description = trace
            .pointer("/meta/description")
            .and_then(Value::as_str)
            .map(String::from);
        let attributes = optional_tree(&format!("{}.attributes", path), trace.get("attributes"))?;
        let layout_attributes = optional_tree(
            &format!("{}.layoutAttributes", path),
            trace.get("layoutAttributes"),
        )?;

        traces.insert(
            name.clone(),
            TraceSchema {
                wire_name,
                description,
                attributes,
                layout_attributes,
            },
        );
    }

    let layout_json = input
        .pointer("/layout/layoutAttributes")
        .ok_or(SchemaError::MissingSection("layout.layoutAttributes"))?;
    let layout = parse_attributes("layout.layoutAttributes", layout_json)?;

    // Older schema dumps carry no config section.
    let config = optional_tree("config", input.get("config"))?;

    Ok(Schema {
        traces,
        layout,
        config,
    })
}

impl Schema {
    /// Parse a `plot-schema.json` document.
    pub fn from_json(input: &Value) -> Result<Self, SchemaError> {
        parse_plot_schema(input)
    }

    /// Read and parse a `plot-schema.json` file.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        load_plot_schema(path)
    }
}

fn optional_tree(path: &str, value: Option<&Value>) -> Result<Attributes, SchemaError> {
    match value {
        Some(value) => parse_attributes(path, value),
        None => Ok(Attributes::new()),
    }
}

fn parse_attributes(path: &str, value: &Value) -> Result<Attributes, SchemaError> {
    let obj = value.as_object().ok_or_else(|| SchemaError::Malformed {
        path: path.to_string(),
        message: "expected an object".into(),
    })?;

    let mut attributes = Attributes::new();
    for (name, child) in obj {
        if !is_attribute_key(name, child) {
            continue;
        }
        let child_path = format!("{}.{}", path, name);
        attributes.insert(name.clone(), parse_attribute(&child_path, child)?);
    }
    Ok(attributes)
}

fn is_attribute_key(name: &str, value: &Value) -> bool {
    value.is_object() && !name.starts_with('_') && !METADATA_KEYS.contains(&name)
}

fn parse_attribute(path: &str, value: &Value) -> Result<Attribute, SchemaError> {
    let description = value
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);

    let kind = match value.get("valType").and_then(Value::as_str) {
        Some("enumerated") => AttrKind::Enumerated(parse_values(path, value)?),
        Some("flaglist") => AttrKind::FlagList {
            flags: string_list(path, value, "flags")?,
            extras: extras_list(path, value)?,
        },
        Some(tag) => AttrKind::Scalar(ValType::from_tag(tag).ok_or_else(|| {
            SchemaError::UnknownValType {
                path: path.to_string(),
                tag: tag.to_string(),
            }
        })?),
        None => parse_container(path, value)?,
    };

    Ok(Attribute { description, kind })
}

/// Objects whose only attribute is `items` with a single object element are
/// container arrays; everything else is a plain object.
fn parse_container(path: &str, value: &Value) -> Result<AttrKind, SchemaError> {
    let attributes = parse_attributes(path, value)?;
    if attributes.len() != 1 {
        return Ok(AttrKind::Object(attributes));
    }

    let Some(items) = value.get("items").and_then(Value::as_object) else {
        return Ok(AttrKind::Object(attributes));
    };
    let elements: Vec<_> = items
        .iter()
        .filter(|(name, child)| is_attribute_key(name, child))
        .collect();
    if let [(item, element)] = elements.as_slice() {
        let element_path = format!("{}.items.{}", path, item);
        let element = parse_attribute(&element_path, element)?;
        if let AttrKind::Object(children) = element.kind {
            return Ok(AttrKind::Array {
                item: (*item).clone(),
                docs: element.description,
                element: children,
            });
        }
    }

    Ok(AttrKind::Object(attributes))
}

fn parse_values(path: &str, value: &Value) -> Result<Vec<RawValue>, SchemaError> {
    let values = value
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| SchemaError::Malformed {
            path: path.to_string(),
            message: "enumerated attribute without a `values` array".into(),
        })?;

    values
        .iter()
        .map(|v| raw_value(v).ok_or_else(|| malformed_value(path, v)))
        .collect()
}

fn raw_value(value: &Value) -> Option<RawValue> {
    match value {
        Value::String(s) => Some(RawValue::String(s.clone())),
        Value::Bool(b) => Some(RawValue::Bool(*b)),
        Value::Number(n) => Some(RawValue::Number(n.clone())),
        _ => None,
    }
}

fn malformed_value(path: &str, value: &Value) -> SchemaError {
    SchemaError::Malformed {
        path: path.to_string(),
        message: format!("unsupported value {}", value),
    }
}

fn string_list(path: &str, value: &Value, key: &str) -> Result<Vec<String>, SchemaError> {
    let Some(list) = value.get(key) else {
        return Ok(Vec::new());
    };
    let list = list.as_array().ok_or_else(|| SchemaError::Malformed {
        path: path.to_string(),
        message: format!("`{}` must be an array", key),
    })?;

    list.iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| malformed_value(path, v))
        })
        .collect()
}

/// Extras are usually strings, but some schemas list booleans (`scrollZoom`).
/// They are kept in their textual form.
fn extras_list(path: &str, value: &Value) -> Result<Vec<String>, SchemaError> {
    let Some(list) = value.get("extras") else {
        return Ok(Vec::new());
    };
    let list = list.as_array().ok_or_else(|| SchemaError::Malformed {
        path: path.to_string(),
        message: "`extras` must be an array".into(),
    })?;

    list.iter()
        .map(|v| {
            raw_value(v)
                .map(|raw| raw.to_string())
                .ok_or_else(|| malformed_value(path, v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal(layout: Value) -> Value {
        json!({
            "traces": {},
            "layout": { "layoutAttributes": layout }
        })
    }

    #[test]
    fn parse_trace_sections() {
        let input = json!({
            "traces": {
                "scatter": {
                    "type": "scatter",
                    "meta": { "description": "Scatter plots." },
                    "attributes": {
                        "type": "scatter",
                        "x": { "valType": "data_array", "editType": "calc" },
                        "_deprecated": { "error_y": { "valType": "any" } }
                    },
                    "layoutAttributes": {
                        "scattermode": { "valType": "enumerated", "values": ["group", "overlay"] }
                    }
                }
            },
            "layout": { "layoutAttributes": {} }
        });

        let schema = parse_plot_schema(&input).unwrap();
        let scatter = schema.trace("scatter").unwrap();
        assert_eq!(scatter.wire_name, "scatter");
        assert_eq!(scatter.description.as_deref(), Some("Scatter plots."));
        assert_eq!(scatter.attributes.names().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(scatter.layout_attributes.len(), 1);
        assert!(schema.config.is_empty());
    }

    #[test]
    fn metadata_members_are_skipped() {
        let input = minimal(json!({
            "title": {
                "role": "object",
                "editType": "layoutstyle",
                "description": "Title options.",
                "text": { "valType": "string" },
                "impliedEdits": { "autorange": false }
            }
        }));

        let schema = parse_plot_schema(&input).unwrap();
        let title = schema.layout.get("title").unwrap();
        assert_eq!(title.description.as_deref(), Some("Title options."));
        match &title.kind {
            AttrKind::Object(children) => {
                assert_eq!(children.names().collect::<Vec<_>>(), vec!["text"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn enumerated_values_keep_their_kind() {
        let input = minimal(json!({
            "hovermode": { "valType": "enumerated", "values": ["x", false, 1] }
        }));

        let schema = parse_plot_schema(&input).unwrap();
        match &schema.layout.get("hovermode").unwrap().kind {
            AttrKind::Enumerated(values) => {
                assert_eq!(values[0], RawValue::String("x".into()));
                assert_eq!(values[1], RawValue::Bool(false));
                assert!(matches!(values[2], RawValue::Number(_)));
            }
            other => panic!("expected enumerated, got {:?}", other),
        }
    }

    #[test]
    fn flag_list_with_boolean_extras() {
        let input = minimal(json!({
            "scrollzoom": {
                "valType": "flaglist",
                "flags": ["cartesian", "geo"],
                "extras": [true, false]
            }
        }));

        let schema = parse_plot_schema(&input).unwrap();
        match &schema.layout.get("scrollzoom").unwrap().kind {
            AttrKind::FlagList { flags, extras } => {
                assert_eq!(flags, &["cartesian", "geo"]);
                assert_eq!(extras, &["true", "false"]);
            }
            other => panic!("expected flag list, got {:?}", other),
        }
    }

    #[test]
    fn items_container_becomes_array() {
        let input = minimal(json!({
            "annotations": {
                "role": "object",
                "items": {
                    "annotation": {
                        "role": "object",
                        "description": "One annotation.",
                        "text": { "valType": "string" }
                    }
                }
            }
        }));

        let schema = parse_plot_schema(&input).unwrap();
        match &schema.layout.get("annotations").unwrap().kind {
            AttrKind::Array {
                item,
                docs,
                element,
            } => {
                assert_eq!(item, "annotation");
                assert_eq!(docs.as_deref(), Some("One annotation."));
                assert!(element.get("text").is_some());
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn unknown_val_type_names_path() {
        let input = minimal(json!({
            "font": { "role": "object", "size": { "valType": "bignum" } }
        }));

        let err = parse_plot_schema(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "layout.layoutAttributes.font.size: unknown valType `bignum`"
        );
    }

    #[test]
    fn missing_layout_section() {
        let err = parse_plot_schema(&json!({ "traces": {} })).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingSection("layout.layoutAttributes")
        ));
    }

    #[test]
    fn enumerated_without_values_is_malformed() {
        let input = minimal(json!({ "dragmode": { "valType": "enumerated" } }));
        assert!(matches!(
            parse_plot_schema(&input),
            Err(SchemaError::Malformed { .. })
        ));
    }
}
