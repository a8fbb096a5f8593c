//! End-to-end generation over the fixture schema.

#![cfg(feature = "backend-rust")]

use plotgen_typegen::ir::{Artifact, FieldType, Scalar};
use plotgen_typegen::output::rust::RUST_BACKEND;
use plotgen_typegen::schema::{Attribute, RawValue, TraceSchema, ValType};
use plotgen_typegen::{
    Backend, ConflictPolicy, GenerateError, Generator, GeneratorOptions, MemorySink, RenderError,
    RenderOptions, Schema, Target,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn load_fixture() -> Schema {
    Schema::from_path(Path::new("tests/fixtures/plot-schema.json")).expect("fixture schema")
}

/// Adds a `box` trace whose `foo_bar` and `fooBar` attributes collide.
fn with_conflicting_trace(mut schema: Schema) -> Schema {
    let mut trace = TraceSchema {
        wire_name: "box".into(),
        ..Default::default()
    };
    trace
        .attributes
        .insert("fooBar", Attribute::scalar(ValType::String));
    trace
        .attributes
        .insert("foo_bar", Attribute::scalar(ValType::Number));
    schema.add_trace("box", trace);
    schema
}

fn generate_all(schema: &Schema) -> MemorySink {
    let sink = MemorySink::new();
    Generator::new(schema, &RUST_BACKEND)
        .create_all(&sink, Path::new(""))
        .unwrap();
    sink
}

#[test]
fn regeneration_is_byte_identical() {
    let first = generate_all(&load_fixture());
    let second = generate_all(&load_fixture());

    assert_eq!(first.paths(), second.paths());
    for path in first.paths() {
        assert_eq!(first.get(&path), second.get(&path), "{}", path.display());
    }
}

#[test]
fn create_all_writes_one_file_per_target() {
    let sink = generate_all(&load_fixture());
    let expected: Vec<PathBuf> = [
        "bar_gen.rs",
        "config_gen.rs",
        "decode_gen.rs",
        "histogram_gen.rs",
        "layout_gen.rs",
        "scatter_gen.rs",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(sink.paths(), expected);

    for path in sink.paths() {
        let source = sink.get(&path).unwrap();
        assert!(
            source.starts_with("// Code generated by plotgen. DO NOT EDIT.\n"),
            "{}",
            path.display()
        );
    }
}

#[test]
fn trace_type_graph() {
    let schema = load_fixture();
    let generator = Generator::new(&schema, &RUST_BACKEND);
    let file = generator.build_trace("scatter").unwrap();

    assert_eq!(file.main.name, "Scatter");
    assert_eq!(file.main.field("Type").unwrap().ty, FieldType::Discriminator);
    assert_eq!(
        file.main.field("X").unwrap().ty,
        FieldType::Scalar(Scalar::Untyped)
    );
    assert_eq!(
        file.main.field("Marker").unwrap().ty,
        FieldType::Object("ScatterMarker".into())
    );

    let marker = file.object("ScatterMarker").unwrap();
    let names: Vec<_> = marker.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Color", "Colorbar", "Colorscale", "Line", "Size", "Symbol"]
    );
    assert!(file.object("ScatterMarkerLine").is_some());
    assert!(file.object("ScatterMarkerColorbar").is_some());

    // `_deprecated` is internal to the charting library.
    assert!(file.main.fields.iter().all(|f| f.json_name != "_deprecated"));
}

#[test]
fn layout_enum_is_union_of_contributions() {
    let schema = load_fixture();
    let file = Generator::new(&schema, &RUST_BACKEND)
        .build_layout()
        .unwrap();

    let shapetype = file.enum_def("LayoutShapetype").unwrap();
    let values: BTreeSet<_> = shapetype
        .variants
        .iter()
        .map(|v| v.value.to_string())
        .collect();
    assert_eq!(shapetype.variants.len(), 3);
    assert_eq!(
        values,
        ["circle", "square", "triangle"]
            .into_iter()
            .map(String::from)
            .collect()
    );

    // bar and histogram both contribute `barmode` and `bargap`.
    assert_eq!(file.enum_def("LayoutBarmode").unwrap().variants.len(), 4);
    let bargap: Vec<_> = file
        .main
        .fields
        .iter()
        .filter(|f| f.json_name == "bargap")
        .collect();
    assert_eq!(bargap.len(), 1);
    assert_eq!(
        bargap[0].docs.as_deref(),
        Some("Sets the gap between bars of adjacent location coordinates.")
    );
}

#[test]
fn layout_has_twelve_axis_fields() {
    let schema = load_fixture();
    let file = Generator::new(&schema, &RUST_BACKEND)
        .build_layout()
        .unwrap();

    for family in ["xaxis", "yaxis"] {
        let base = file
            .main
            .fields
            .iter()
            .find(|f| f.json_name == family)
            .unwrap();
        let axes: Vec<_> = file
            .main
            .fields
            .iter()
            .filter(|f| f.json_name.starts_with(family))
            .collect();
        assert_eq!(axes.len(), 6, "{}", family);
        assert!(axes.iter().all(|f| f.ty == base.ty));
    }

    let source = Generator::new(&schema, &RUST_BACKEND)
        .write_layout()
        .unwrap();
    assert!(source.contains("pub xaxis6: Option<LayoutXaxis>,"));
    assert!(source.contains("pub yaxis2: Option<LayoutYaxis>,"));
}

#[test]
fn identifiers_and_literals_are_escaped() {
    let schema = load_fixture();
    let generator = Generator::new(&schema, &RUST_BACKEND);

    let scatter = generator.write_trace("scatter").unwrap();
    assert!(scatter.contains("BottomHyphenleft,"));
    assert!(scatter.contains("XHyphenthinHyphenopen,"));

    let layout = generator.write_layout().unwrap();
    assert!(layout.contains(r#"#[serde(rename = "back\\slash")]"#));
    assert!(layout.contains("BackDoublebackslashslash,"));
    assert!(layout.contains("pub annotations: Option<Vec<LayoutAnnotation>>,"));
    assert!(layout.contains("pub paper_bgcolor: Option<Color>,"));

    let config = generator.write_config().unwrap();
    assert!(config.contains("pub plotly_server_url: Option<String>,"));
    assert!(config.contains("ref v if *v == \"hover\" => Ok(Self::Hover),"));
    assert!(config.contains("serde_json::Value::Bool(b) => b.to_string().parse()"));
}

#[test]
fn colliding_values_get_distinct_variants() {
    let schema = load_fixture();
    let generator = Generator::new(&schema, &RUST_BACKEND);
    let file = generator.build_trace("scatter").unwrap();

    let cases: [(&str, Vec<(RawValue, &str)>); 2] = [
        (
            "ScatterMarkerSymbol",
            vec![
                (RawValue::from("circle"), "Circle"),
                (RawValue::Number(0.into()), "V0"),
                (RawValue::from("0"), "String0"),
                (RawValue::Number(100.into()), "V100"),
                (RawValue::from("100"), "String100"),
                (RawValue::from("circle-open"), "CircleHyphenopen"),
            ],
        ),
        (
            "ScatterMarkerColorbarExponentformat",
            vec![
                (RawValue::from("none"), "None"),
                (RawValue::from("e"), "E"),
                (RawValue::from("E"), "E2"),
                (RawValue::from("SI"), "SI"),
                (RawValue::from("B"), "B"),
            ],
        ),
    ];
    for (name, expected) in &cases {
        let def = file.enum_def(name).unwrap();
        let names: BTreeSet<_> = def.variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names.len(), def.variants.len(), "{}", name);
        for (value, variant) in expected {
            assert_eq!(def.variant(value).unwrap().name, *variant, "{}", value.literal());
        }
    }

    // Every raw value reaches its own variant in both directions.
    let source = generator.write_trace("scatter").unwrap();
    for line in [
        "Self::V0 => serde_json::Value::from(0i64),",
        "Self::String0 => serde_json::Value::from(\"0\"),",
        "Self::String100 => serde_json::Value::from(\"100\"),",
        "ref v if *v == 0i64 => Ok(Self::V0),",
        "ref v if *v == \"0\" => Ok(Self::String0),",
        "ref v if *v == 100i64 => Ok(Self::V100),",
        "ref v if *v == \"100\" => Ok(Self::String100),",
        "Self::E2 => serde_json::Value::from(\"E\"),",
    ] {
        assert!(source.contains(line), "missing `{}`", line);
    }
    assert!(source.contains("#[serde(rename = \"e\")]\n    E,\n"));
    assert!(source.contains("#[serde(rename = \"E\")]\n    E2,\n"));
}

#[test]
fn decoder_lists_traces_in_order() {
    let schema = load_fixture();
    let generator = Generator::new(&schema, &RUST_BACKEND);

    insta::assert_json_snapshot!(generator.trace_entries(), @r#"
    [
      {
        "wire_name": "bar",
        "type_name": "Bar"
      },
      {
        "wire_name": "histogram",
        "type_name": "Histogram"
      },
      {
        "wire_name": "scatter",
        "type_name": "Scatter"
      }
    ]
    "#);

    let source = generator.write_decoder().unwrap();
    assert!(source.contains("Histogram(Histogram),"));
    assert!(source.contains("unknown_variant(other, &[\"bar\", \"histogram\", \"scatter\"])"));
}

struct BrokenBackend;

impl Backend for BrokenBackend {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn language(&self) -> &'static str {
        "rust"
    }

    fn extension(&self) -> &'static str {
        "rs"
    }

    fn render(&self, artifact: &Artifact, _: &RenderOptions) -> Result<String, RenderError> {
        Ok(format!("pub struct {} {{", artifact.label()))
    }

    fn validate(&self, source: &str) -> Result<(), String> {
        plotgen_typegen::output::check_rust_syntax(source)
    }
}

#[test]
fn invalid_output_never_reaches_the_sink() {
    let schema = load_fixture();
    let sink = MemorySink::new();
    let err = Generator::new(&schema, &BrokenBackend)
        .create_layout(&sink, Path::new(""))
        .unwrap_err();

    assert!(matches!(
        err,
        GenerateError::FormatValidation { ref target, .. } if target == "layout"
    ));
    assert!(sink.is_empty());
}

#[test]
fn batch_aborts_on_first_failure() {
    let schema = with_conflicting_trace(load_fixture());
    let sink = MemorySink::new();
    let err = Generator::new(&schema, &RUST_BACKEND)
        .create_traces(&sink, Path::new(""))
        .unwrap_err();

    match err {
        GenerateError::TypeSynthesis { target, path, .. } => {
            assert_eq!(target, "box");
            assert_eq!(path, "Box.foo_bar");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(sink.paths(), vec![PathBuf::from("bar_gen.rs")]);
}

#[test]
fn keep_first_policy_tolerates_conflicts() {
    let schema = with_conflicting_trace(load_fixture());
    let generator = Generator::new(&schema, &RUST_BACKEND).with_options(GeneratorOptions {
        policy: ConflictPolicy::KeepFirst,
        ..Default::default()
    });

    let file = generator.build_trace("box").unwrap();
    let foo_bar = file.main.field("FooBar").unwrap();
    assert_eq!(foo_bar.json_name, "fooBar");
    assert_eq!(foo_bar.ty, FieldType::Scalar(Scalar::String));

    let sink = MemorySink::new();
    generator
        .create_targets(
            &sink,
            Path::new("gen"),
            &[Target::from_name("box"), Target::Decoder],
        )
        .unwrap();
    let source = sink.get("gen/box_gen.rs").unwrap();
    assert!(source.contains("pub const TRACE_TYPE: TraceType = TraceType::Box;"));
    assert!(!source.contains("\"foo_bar\""));
}

#[test]
fn custom_generator_name_in_marker() {
    let schema = load_fixture();
    let generator = Generator::new(&schema, &RUST_BACKEND).with_options(GeneratorOptions {
        render: RenderOptions {
            generator: "plotgen-test".into(),
        },
        ..Default::default()
    });
    let source = generator.write_config().unwrap();
    assert!(source.starts_with("// Code generated by plotgen-test. DO NOT EDIT.\n"));
}
