//! Configuration loading and resolution.
//!
//! A [`Config`] is the mutable, mergeable form: loaded from `maestro.toml`,
//! overridden programmatically, and threaded through the plugins' `config`
//! hook as the accumulating memo. Resolution freezes it into a
//! [`ResolvedConfig`] that the rest of the runtime treats as immutable.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Hard cap on loop-driver turns when the config does not set one.
pub const DEFAULT_MAX_TURNS: usize = 50;

const CONFIG_FILE_NAME: &str = "maestro.toml";

/// Mergeable configuration, every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default model for the ambient conversation (what "inherit" binds to).
    pub model: Option<String>,
    /// Hard cap on turns per agent run.
    pub max_turns: Option<usize>,
    /// Directory holding per-agent session logs.
    pub session_dir: Option<PathBuf>,
    /// Open bag for plugin-owned settings, keyed by plugin name.
    pub extensions: Map<String, Value>,
}

impl Config {
    /// Load `maestro.toml` from the working directory. A missing file is not
    /// an error; a malformed one is.
    pub fn load(cwd: &Path) -> Result<Self> {
        let path = cwd.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Merge `overrides` on top of `self`. Set fields in `overrides` win;
    /// extension entries are merged key-by-key with `overrides` winning.
    pub fn merged_with(mut self, overrides: Config) -> Self {
        if overrides.model.is_some() {
            self.model = overrides.model;
        }
        if overrides.max_turns.is_some() {
            self.max_turns = overrides.max_turns;
        }
        if overrides.session_dir.is_some() {
            self.session_dir = overrides.session_dir;
        }
        for (key, value) in overrides.extensions {
            self.extensions.insert(key, value);
        }
        self
    }
}

/// Immutable, fully-defaulted configuration for a running context.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub model: Option<String>,
    pub max_turns: usize,
    pub session_dir: PathBuf,
    pub working_dir: PathBuf,
    pub extensions: Map<String, Value>,
}

impl ResolvedConfig {
    /// Freeze a merged [`Config`] for the given working directory.
    pub fn resolve(config: Config, working_dir: &Path) -> Self {
        let session_dir = config
            .session_dir
            .unwrap_or_else(|| default_session_dir(working_dir));

        Self {
            model: config.model,
            max_turns: config.max_turns.unwrap_or(DEFAULT_MAX_TURNS),
            session_dir,
            working_dir: working_dir.to_path_buf(),
            extensions: config.extensions,
        }
    }

    /// Plugin-owned settings for `name`, if any.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            model: None,
            max_turns: DEFAULT_MAX_TURNS,
            session_dir: std::env::temp_dir(),
            working_dir: std::env::temp_dir(),
            extensions: Map::new(),
        }
    }
}

fn default_session_dir(working_dir: &Path) -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("maestro").join("agents"))
        .unwrap_or_else(|| working_dir.join(".maestro").join("agents"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_override_fields() {
        let base = Config {
            model: Some("acme/fast-1".to_string()),
            max_turns: Some(10),
            ..Default::default()
        };
        let overrides = Config {
            model: Some("acme/slow-1".to_string()),
            ..Default::default()
        };

        let merged = base.merged_with(overrides);
        assert_eq!(merged.model.as_deref(), Some("acme/slow-1"));
        assert_eq!(merged.max_turns, Some(10));
    }

    #[test]
    fn resolve_applies_defaults() {
        let resolved = ResolvedConfig::resolve(Config::default(), Path::new("/tmp/project"));
        assert_eq!(resolved.max_turns, DEFAULT_MAX_TURNS);
        assert!(resolved.model.is_none());
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("maestro.toml"),
            "model = \"acme/fast-1\"\nmax_turns = 12\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.model.as_deref(), Some("acme/fast-1"));
        assert_eq!(config.max_turns, Some(12));
    }
}
