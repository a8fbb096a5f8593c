//! Output backends for code generation.
//!
//! Each backend takes an [`Artifact`](crate::ir::Artifact) and produces code.
//! All backends implement the [`Backend`](crate::traits::Backend) trait for
//! uniform access via the registry.

// Rust
#[cfg(feature = "backend-rust")]
pub mod rust;

#[cfg(feature = "backend-rust")]
pub use rust::{RustBackend, check_rust_syntax, render_rust};
