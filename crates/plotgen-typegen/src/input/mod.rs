//! Input format parsers.
//!
//! Each parser reads a schema document and produces the in-memory
//! [`Schema`](crate::schema::Schema).

mod plot_schema;

pub use plot_schema::{SchemaError, load_plot_schema, parse_plot_schema};
