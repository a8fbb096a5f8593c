//! `plotgen.toml` loading.
//!
//! Search order: the `--config` path when given, then `./plotgen.toml`,
//! then built-in defaults. Relative paths in a config file are resolved
//! against the file's directory.

use anyhow::{Context, Result};
use plotgen_typegen::ConflictPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "plotgen.toml";

/// Conflict handling when two contributors disagree on a field's type.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    serde::Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictMode {
    /// Fail generation
    #[default]
    Strict,
    /// Keep the first contribution and log a warning
    KeepFirst,
}

impl From<ConflictMode> for ConflictPolicy {
    fn from(mode: ConflictMode) -> Self {
        match mode {
            ConflictMode::Strict => ConflictPolicy::Strict,
            ConflictMode::KeepFirst => ConflictPolicy::KeepFirst,
        }
    }
}

/// Project configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, schemars::JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct PlotgenConfig {
    /// Path to `plot-schema.json`.
    pub schema: Option<PathBuf>,
    /// Directory generated files are written to.
    pub out_dir: PathBuf,
    /// Output backend name.
    pub backend: String,
    /// Generator name written into the machine-generated marker.
    pub generator: String,
    pub conflict_policy: ConflictMode,
    /// Targets to generate; empty means every target.
    pub targets: Vec<String>,
}

impl Default for PlotgenConfig {
    fn default() -> Self {
        Self {
            schema: None,
            out_dir: PathBuf::from("gen"),
            backend: "rust".to_string(),
            generator: "plotgen".to_string(),
            conflict_policy: ConflictMode::default(),
            targets: Vec::new(),
        }
    }
}

impl PlotgenConfig {
    /// Explicit path, else `./plotgen.toml`, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }
        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(schema) = self.schema.as_mut()
            && schema.is_relative()
        {
            *schema = base.join(&*schema);
        }
        if self.out_dir.is_relative() {
            self.out_dir = base.join(&self.out_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: PlotgenConfig = toml::from_str("").unwrap();
        assert_eq!(config, PlotgenConfig::default());
        assert_eq!(config.backend, "rust");
        assert_eq!(config.out_dir, PathBuf::from("gen"));
    }

    #[test]
    fn parse_all_keys() {
        let config: PlotgenConfig = toml::from_str(
            r#"
            schema = "plot-schema.json"
            out_dir = "src/generated"
            backend = "rust"
            generator = "my-tool"
            conflict_policy = "keep-first"
            targets = ["scatter", "layout"]
            "#,
        )
        .unwrap();
        assert_eq!(config.schema, Some(PathBuf::from("plot-schema.json")));
        assert_eq!(config.generator, "my-tool");
        assert_eq!(config.conflict_policy, ConflictMode::KeepFirst);
        assert_eq!(config.targets, vec!["scatter", "layout"]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(toml::from_str::<PlotgenConfig>("outdir = \"gen\"").is_err());
    }

    #[test]
    fn relative_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "schema = \"schema/plot.json\"\n").unwrap();

        let config = PlotgenConfig::load(&path).unwrap();
        assert_eq!(config.schema, Some(dir.path().join("schema/plot.json")));
        assert_eq!(config.out_dir, dir.path().join("gen"));
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlotgenConfig::discover(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().starts_with("failed to read config"));
    }

    #[test]
    fn conflict_mode_maps_to_policy() {
        assert_eq!(
            ConflictPolicy::from(ConflictMode::KeepFirst),
            ConflictPolicy::KeepFirst
        );
        assert_eq!(ConflictPolicy::from(ConflictMode::default()), ConflictPolicy::Strict);
    }
}
