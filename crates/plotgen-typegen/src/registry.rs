//! Registry for code generation backends.

use crate::traits::Backend;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Global registry of backends.
static BACKENDS: RwLock<Vec<&'static dyn Backend>> = RwLock::new(Vec::new());
static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Register a custom backend.
///
/// Built-in backends are registered automatically on first use. A custom
/// backend sharing a built-in's name is shadowed by it.
pub fn register_backend(backend: &'static dyn Backend) {
    init_builtin();
    BACKENDS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(backend);
}

/// Initialize built-in backends (called automatically on first use).
fn init_builtin() {
    INITIALIZED.get_or_init(|| {
        #[allow(unused_mut, unused_variables)]
        let mut backends = BACKENDS.write().unwrap_or_else(PoisonError::into_inner);

        #[cfg(feature = "backend-rust")]
        {
            backends.push(&crate::output::rust::RUST_BACKEND);
        }
    });
}

/// Get a backend by name.
pub fn get_backend(name: &str) -> Option<&'static dyn Backend> {
    init_builtin();
    BACKENDS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|b| b.name() == name)
        .copied()
}

/// Get all backends for a language.
pub fn backends_for_language(language: &str) -> Vec<&'static dyn Backend> {
    init_builtin();
    BACKENDS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|b| b.language() == language)
        .copied()
        .collect()
}

/// List all registered backends.
pub fn backends() -> Vec<&'static dyn Backend> {
    init_builtin();
    BACKENDS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// List all registered backend names.
pub fn backend_names() -> Vec<&'static str> {
    init_builtin();
    BACKENDS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|b| b.name())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Artifact;
    use crate::traits::{RenderError, RenderOptions};

    struct EchoBackend;

    impl Backend for EchoBackend {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn language(&self) -> &'static str {
            "text"
        }
        fn extension(&self) -> &'static str {
            "txt"
        }
        fn render(&self, artifact: &Artifact, _: &RenderOptions) -> Result<String, RenderError> {
            Ok(artifact.label().to_string())
        }
        fn validate(&self, _: &str) -> Result<(), String> {
            Ok(())
        }
    }

    static ECHO_BACKEND: EchoBackend = EchoBackend;

    #[cfg(feature = "backend-rust")]
    #[test]
    fn builtin_rust_backend() {
        let backend = get_backend("rust").unwrap();
        assert_eq!(backend.extension(), "rs");
        assert!(backend_names().contains(&"rust"));
        assert!(!backends_for_language("rust").is_empty());
    }

    #[test]
    fn register_custom_backend() {
        register_backend(&ECHO_BACKEND);
        let backend = get_backend("echo").unwrap();
        assert_eq!(backend.language(), "text");
        assert!(backends().iter().any(|b| b.name() == "echo"));
        assert!(get_backend("missing").is_none());
    }
}
