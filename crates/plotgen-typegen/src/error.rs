//! Errors raised while generating an artifact.

use std::path::PathBuf;

/// Failure at one stage of build → assemble → render → validate → persist.
///
/// `target` is the trace name, `layout`, `config` or `decoder`; `path` is the
/// dotted attribute path inside that target.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{target}: unknown attribute `{path}`")]
    SchemaResolution { target: String, path: String },

    #[error("{target}: cannot synthesize `{path}`: {reason}")]
    TypeSynthesis {
        target: String,
        path: String,
        reason: String,
    },

    #[error("{target}: cannot render: {message}")]
    Render { target: String, message: String },

    #[error("cannot write {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{target}: generated source failed the syntax check: {message}")]
    FormatValidation { target: String, message: String },
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
