//! Data model for a parsed role defaults file, format-agnostic.

use clap::ValueEnum;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Which role tree a defaults file came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    #[default]
    Saltbox,
    Sandbox,
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoType::Saltbox => f.write_str("saltbox"),
            RepoType::Sandbox => f.write_str("sandbox"),
        }
    }
}

/// A single variable definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    /// Value exactly as written after `name:`; continuation lines keep
    /// their file indentation.
    pub raw_value: String,
    /// Enclosing section, empty before the first section header.
    pub section: String,
    pub subsection: String,
    pub comment: String,
    pub is_multiline: bool,
    /// `value_lines[0]` is the value portion of the defining line.
    pub value_lines: Vec<String>,
    /// 1-based line of the `name:` line.
    pub line_number: usize,
}

/// A named group of variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub variables: Vec<Variable>,
    pub subsections: HashMap<String, Vec<Variable>>,
    pub subsection_order: Vec<String>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Subsections in the order they were first seen.
    pub fn ordered_subsections(&self) -> impl Iterator<Item = (&str, &[Variable])> {
        self.subsection_order.iter().map(|name| {
            let vars = self
                .subsections
                .get(name)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (name.as_str(), vars)
        })
    }
}

/// Everything extracted from one defaults file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleInfo {
    pub name: String,
    pub repo_type: RepoType,
    pub sections: HashMap<String, Section>,
    pub section_order: Vec<String>,
    /// Every kept variable in document order.
    pub all_variables: Vec<Variable>,
    pub has_instances: bool,
    /// Name of the `*_instances` variable when `has_instances` is set.
    pub instances_var: Option<String>,
    pub has_default_vars: bool,
    pub sso_enabled: bool,
    pub has_dns: bool,
    pub has_traefik: bool,
    pub has_docker: bool,
    pub has_web: bool,
    pub has_themepark: bool,
}

impl RoleInfo {
    pub fn new(name: impl Into<String>, repo_type: RepoType) -> Self {
        Self {
            name: name.into(),
            repo_type,
            ..Default::default()
        }
    }

    /// Sections in source order.
    pub fn ordered_sections(&self) -> impl Iterator<Item = &Section> {
        self.section_order
            .iter()
            .filter_map(|name| self.sections.get(name))
    }
}
