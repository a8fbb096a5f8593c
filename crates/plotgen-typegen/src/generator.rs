//! Per-artifact driver: build → assemble → render → validate → persist.

use crate::assemble::AxisFixup;
use crate::builder::TypeGraphBuilder;
use crate::error::{GenerateError, Result};
use crate::ir::{Artifact, Field, StructDef, TraceEntry, TypeFile};
use crate::merge::ConflictPolicy;
use crate::naming::to_camel_case;
use crate::schema::Schema;
use crate::sink::Sink;
use crate::traits::{Backend, RenderOptions};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One unit of generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Trace(String),
    Layout,
    Config,
    Decoder,
}

impl Target {
    /// `layout`, `config` and `decoder` name the shared targets; anything
    /// else is a trace name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "layout" => Self::Layout,
            "config" => Self::Config,
            "decoder" => Self::Decoder,
            trace => Self::Trace(trace.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Trace(name) => name,
            Self::Layout => "layout",
            Self::Config => "config",
            Self::Decoder => "decoder",
        }
    }

    /// Output file name (`scatter_gen.rs`, `decode_gen.rs`, ...).
    pub fn file_name(&self, extension: &str) -> String {
        let stem = match self {
            Self::Decoder => "decode",
            other => other.label(),
        };
        format!("{}_gen.{}", stem, extension)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options for a [`Generator`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub policy: ConflictPolicy,
    pub render: RenderOptions,
    /// Axis fix-up applied to the layout.
    pub axes: AxisFixup,
}

/// Generates artifacts from a schema with one backend.
pub struct Generator<'a> {
    schema: &'a Schema,
    backend: &'a dyn Backend,
    options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    pub fn new(schema: &'a Schema, backend: &'a dyn Backend) -> Self {
        Self {
            schema,
            backend,
            options: GeneratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Every target: traces in name order, then layout, config and decoder.
    pub fn targets(&self) -> Vec<Target> {
        self.schema
            .trace_names()
            .map(|name| Target::Trace(name.to_string()))
            .chain([Target::Layout, Target::Config, Target::Decoder])
            .collect()
    }

    pub fn build_trace(&self, name: &str) -> Result<TypeFile> {
        let trace = self
            .schema
            .trace(name)
            .ok_or_else(|| GenerateError::SchemaResolution {
                target: name.to_string(),
                path: format!("traces.{}", name),
            })?;
        let type_name = to_camel_case(name);

        let mut builder = TypeGraphBuilder::new(name, self.options.policy);
        let fields = builder.parse_attributes(
            &type_name,
            &type_name,
            &trace.attributes,
            trace.attributes.names(),
        )?;

        let mut main = StructDef::new(&type_name).with_docs(trace.description.clone());
        main.fields.push(Field::discriminator());
        builder.contribute(&type_name, &mut main, fields)?;
        builder.finish(main, None)
    }

    /// The layout's own attributes, then every trace's layout contribution
    /// in trace-name order.
    pub fn build_layout(&self) -> Result<TypeFile> {
        let mut builder = TypeGraphBuilder::new("layout", self.options.policy);
        let mut main = StructDef::new("Layout");

        let layout = &self.schema.layout;
        let fields = builder.parse_attributes("Layout", "Layout", layout, layout.names())?;
        builder.contribute("Layout", &mut main, fields)?;

        for (name, trace) in &self.schema.traces {
            let contribution = &trace.layout_attributes;
            if contribution.is_empty() {
                continue;
            }
            debug!(trace = %name, attributes = contribution.len(), "layout contribution");
            let owner = to_camel_case(name);
            let fields =
                builder.parse_attributes(&owner, "Layout", contribution, contribution.names())?;
            builder.contribute(&owner, &mut main, fields)?;
        }

        builder.finish(main, Some(&self.options.axes))
    }

    pub fn build_config(&self) -> Result<TypeFile> {
        let mut builder = TypeGraphBuilder::new("config", self.options.policy);
        let config = &self.schema.config;
        let fields = builder.parse_attributes("Config", "Config", config, config.names())?;
        let mut main = StructDef::new("Config");
        builder.contribute("Config", &mut main, fields)?;
        builder.finish(main, None)
    }

    /// Every trace known to the decoder, in type-name order.
    pub fn trace_entries(&self) -> Vec<TraceEntry> {
        let mut entries: Vec<_> = self
            .schema
            .traces
            .iter()
            .map(|(name, trace)| TraceEntry {
                wire_name: trace.wire_name.clone(),
                type_name: to_camel_case(name),
            })
            .collect();
        entries.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        entries
    }

    /// Build the artifact of `target`.
    pub fn artifact(&self, target: &Target) -> Result<Artifact> {
        Ok(match target {
            Target::Trace(name) => {
                let file = self.build_trace(name)?;
                let wire_name = self
                    .schema
                    .trace(name)
                    .map(|t| t.wire_name.clone())
                    .unwrap_or_else(|| name.clone());
                Artifact::Trace { wire_name, file }
            }
            Target::Layout => Artifact::Layout {
                file: self.build_layout()?,
            },
            Target::Config => Artifact::Config {
                file: self.build_config()?,
            },
            Target::Decoder => Artifact::Decoder {
                traces: self.trace_entries(),
            },
        })
    }

    /// Render and validate `target`.
    pub fn write(&self, target: &Target) -> Result<String> {
        let artifact = self.artifact(target)?;
        let source = self
            .backend
            .render(&artifact, &self.options.render)
            .map_err(|e| GenerateError::Render {
                target: target.to_string(),
                message: e.to_string(),
            })?;
        self.backend
            .validate(&source)
            .map_err(|message| GenerateError::FormatValidation {
                target: target.to_string(),
                message,
            })?;
        Ok(source)
    }

    pub fn write_trace(&self, name: &str) -> Result<String> {
        self.write(&Target::Trace(name.to_string()))
    }

    pub fn write_layout(&self) -> Result<String> {
        self.write(&Target::Layout)
    }

    pub fn write_config(&self) -> Result<String> {
        self.write(&Target::Config)
    }

    pub fn write_decoder(&self) -> Result<String> {
        self.write(&Target::Decoder)
    }

    /// Render, validate and persist `target` to `<dir>/<file name>` in
    /// `sink`. Nothing reaches the sink unless validation passed.
    pub fn create(&self, sink: &dyn Sink, dir: &Path, target: &Target) -> Result<PathBuf> {
        let source = self.write(target)?;
        let path = dir.join(target.file_name(self.backend.extension()));
        let sink_error = |source| GenerateError::Sink {
            path: path.clone(),
            source,
        };

        let mut dest = sink.create(&path).map_err(sink_error)?;
        dest.write_all(source.as_bytes()).map_err(sink_error)?;
        dest.commit().map_err(sink_error)?;

        info!(artifact = %target, path = %path.display(), bytes = source.len(), "generated");
        Ok(path)
    }

    pub fn create_trace(&self, sink: &dyn Sink, dir: &Path, name: &str) -> Result<PathBuf> {
        self.create(sink, dir, &Target::Trace(name.to_string()))
    }

    pub fn create_layout(&self, sink: &dyn Sink, dir: &Path) -> Result<PathBuf> {
        self.create(sink, dir, &Target::Layout)
    }

    pub fn create_config(&self, sink: &dyn Sink, dir: &Path) -> Result<PathBuf> {
        self.create(sink, dir, &Target::Config)
    }

    pub fn create_decoder(&self, sink: &dyn Sink, dir: &Path) -> Result<PathBuf> {
        self.create(sink, dir, &Target::Decoder)
    }

    /// Every trace in name order, stopping at the first failure.
    pub fn create_traces(&self, sink: &dyn Sink, dir: &Path) -> Result<Vec<PathBuf>> {
        self.schema
            .trace_names()
            .map(|name| self.create_trace(sink, dir, name))
            .collect()
    }

    /// Every target, stopping at the first failure.
    pub fn create_all(&self, sink: &dyn Sink, dir: &Path) -> Result<Vec<PathBuf>> {
        self.create_targets(sink, dir, &self.targets())
    }

    pub fn create_targets(
        &self,
        sink: &dyn Sink,
        dir: &Path,
        targets: &[Target],
    ) -> Result<Vec<PathBuf>> {
        targets
            .iter()
            .map(|target| self.create(sink, dir, target))
            .collect()
    }
}
