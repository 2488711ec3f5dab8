//! External configuration: type-inference tables and ignore lists.
//!
//! Loaded from YAML. Every table is optional; an empty config leaves only
//! the built-in heuristics in play.

use crate::error::{Error, Result};
use crate::types::VarType;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub type_inference: TypeInferenceConfig,
    pub global_overrides: IgnoreList,
    pub docker_overrides: IgnoreList,
}

/// Operator-supplied type rules. Suffix tables keep file order and the
/// first matching suffix wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypeInferenceConfig {
    pub exact: IndexMap<String, VarType>,
    pub overrides: IndexMap<String, VarType>,
    pub patterns: Vec<TypePattern>,
}

/// `name` contains `suffix_contains` ⇒ `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypePattern {
    pub suffix_contains: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IgnoreList {
    pub ignore_suffixes: Vec<String>,
}

impl Config {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            exact = config.type_inference.exact.len(),
            overrides = config.type_inference.overrides.len(),
            patterns = config.type_inference.patterns.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Parse config from YAML text. An empty document is the default config.
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}
