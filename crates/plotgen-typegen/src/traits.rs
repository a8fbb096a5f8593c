//! Traits for code generation backends.

use crate::ir::Artifact;

/// Options shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Generator name written into the machine-generated marker.
    pub generator: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            generator: "plotgen".to_string(),
        }
    }
}

/// Malformed type graph reaching a backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("empty {0} name")]
    EmptyName(&'static str),

    #[error("`{0}` is declared more than once")]
    DuplicateType(String),

    #[error("`{owner}.{field}` references undeclared type `{ty}`")]
    UndeclaredType {
        owner: String,
        field: String,
        ty: String,
    },

    #[error("fields `{first}` and `{second}` of `{owner}` both map to `{ident}`")]
    DuplicateField {
        owner: String,
        first: String,
        second: String,
        ident: String,
    },

    #[error("`{owner}.{field}`: discriminator outside a trace")]
    MisplacedDiscriminator { owner: String, field: String },

    #[error("`{0}` has no variants")]
    EmptyEnum(String),

    #[error("decoder needs at least one trace")]
    NoTraces,
}

/// A code generation backend.
///
/// Backends render an [`Artifact`] into source code for a target language and
/// own the syntax check for that language.
///
/// # Implementing Custom Backends
///
/// ```ignore
/// use plotgen_typegen::{Backend, RenderError, RenderOptions, ir::Artifact, register_backend};
///
/// struct MyBackend;
///
/// impl Backend for MyBackend {
///     fn name(&self) -> &'static str { "my-backend" }
///     fn language(&self) -> &'static str { "kotlin" }
///     fn extension(&self) -> &'static str { "kt" }
///     fn render(&self, artifact: &Artifact, options: &RenderOptions) -> Result<String, RenderError> { /* ... */ }
///     fn validate(&self, source: &str) -> Result<(), String> { Ok(()) }
/// }
///
/// // Register before first use
/// register_backend(&MyBackend);
/// ```
pub trait Backend: Send + Sync {
    /// Unique backend identifier (e.g., "rust").
    fn name(&self) -> &'static str;

    /// Target language (e.g., "rust").
    fn language(&self) -> &'static str;

    /// File extension for generated code (e.g., "rs").
    fn extension(&self) -> &'static str;

    /// Render one artifact.
    fn render(&self, artifact: &Artifact, options: &RenderOptions) -> Result<String, RenderError>;

    /// Syntax check run on rendered text before it is persisted.
    fn validate(&self, source: &str) -> Result<(), String>;
}
