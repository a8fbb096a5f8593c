//! Typed binding generation from a charting library's attribute schema.
//!
//! `plotgen-typegen` compiles the nested attribute schema of a charting
//! library (per-trace options, a shared layout, a global config) into
//! strongly-typed declarations: structs, enums, OR-combinable flag types and
//! a discriminator-driven trace decoder.
//!
//! # Architecture
//!
//! ```text
//! Input              Type graph                        Output
//! ──────────    ─────────────────────────────    ─────────────────
//!               TypeGraphBuilder ─┐
//! plot-schema ─> Schema ──────────┼─> Merger ─┐
//! (input/)      (schema.rs)       │ (merge.rs) ├─> assemble ─> TypeFile ─> Backend ─> syntax gate ─> Sink
//!               Namer ────────────┘            │  (assemble.rs) (ir.rs)     (output/)                (sink.rs)
//! ```
//!
//! One type graph is built per target: a trace, the layout (own attributes
//! plus every trace's layout contribution) or the config. The decoder is
//! rendered from the list of traces alone.
//!
//! # Example
//!
//! ```
//! use plotgen_typegen::{Generator, Schema, get_backend};
//!
//! let input = serde_json::json!({
//!     "traces": {
//!         "scatter": {
//!             "type": "scatter",
//!             "attributes": {
//!                 "x": { "valType": "data_array" },
//!                 "marker": { "color": { "valType": "color" } }
//!             }
//!         }
//!     },
//!     "layout": { "layoutAttributes": {
//!         "xaxis": { "title": { "valType": "string" } },
//!         "yaxis": { "title": { "valType": "string" } }
//!     } }
//! });
//!
//! let schema = Schema::from_json(&input).unwrap();
//! let backend = get_backend("rust").unwrap();
//! let generator = Generator::new(&schema, backend);
//!
//! let source = generator.write_trace("scatter").unwrap();
//! assert!(source.contains("pub struct ScatterMarker"));
//! ```
//!
//! # Feature Flags
//!
//! Backend flags (use `backend-*` prefix):
//! - `backend-rust` - Rust structs and enums with serde

pub mod assemble;
pub mod builder;
pub mod error;
pub mod generator;
pub mod input;
pub mod ir;
pub mod merge;
pub mod naming;
pub mod output;
pub mod registry;
pub mod schema;
pub mod sink;
pub mod traits;

// Re-export commonly used items
pub use assemble::AxisFixup;
pub use builder::TypeGraphBuilder;
pub use error::{GenerateError, Result};
pub use generator::{Generator, GeneratorOptions, Target};
pub use input::{SchemaError, load_plot_schema, parse_plot_schema};
pub use merge::ConflictPolicy;
pub use schema::Schema;
pub use sink::{Destination, DirSink, MemorySink, Sink};

// Re-export traits
pub use traits::{Backend, RenderError, RenderOptions};

// Re-export registry functions
pub use registry::{backend_names, backends, backends_for_language, get_backend, register_backend};

// Re-export backend structs
#[cfg(feature = "backend-rust")]
pub use output::rust::RustBackend;
