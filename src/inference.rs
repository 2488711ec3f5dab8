//! Variable type inference.
//!
//! Precedence, first match wins:
//!
//! 1. `exact` suffix table from config
//! 2. `overrides` suffix table from config
//! 3. literal value shape
//! 4. `patterns` substring rules from config
//! 5. built-in name-suffix heuristics, defaulting to `string`
//!
//! A quoted literal is a `string`. Templating expressions (`{{ ... }}`,
//! quoted or not) have no literal shape of their own, so they continue to
//! steps 4 and 5 and only end up as `string` when no naming rule applies.

use crate::config::TypeInferenceConfig;
use crate::types::VarType;
use regex::Regex;
use std::sync::LazyLock;

static RE_BOOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(true|True|TRUE|yes|Yes|YES|false|False|FALSE|no|No|NO)$").unwrap()
});

static RE_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());

static RE_FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+\.\d+$").unwrap());

/// Name suffix → type, checked in order against the lowercased name.
const NAME_SUFFIX_RULES: &[(&[&str], VarType)] = &[
    (&["_enabled", "_proxy", "_insecure"], VarType::Bool),
    (
        &[
            "_domain",
            "_subdomain",
            "_url",
            "_path",
            "_location",
            "_folder",
            "_name",
            "_container",
            "_image",
            "_tag",
            "_repo",
            "_record",
            "_zone",
            "_token",
            "_theme",
        ],
        VarType::String,
    ),
    (&["_port", "_timeout"], VarType::StringNumber),
    (&["_scheme"], VarType::StringHttpHttps),
    (
        &[
            "_list",
            "_ports",
            "_volumes",
            "_networks",
            "_labels",
            "_devices",
            "_addons",
            "_instances",
        ],
        VarType::List,
    ),
    (&["_envs", "_dict", "_options"], VarType::Dict),
];

/// Shape of a raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    /// The literal decides the type.
    Literal(VarType),
    /// A string whose meaning is only known at render time.
    Opaque,
}

/// Infers variable types from name, value and optional config tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeInferrer<'a> {
    config: Option<&'a TypeInferenceConfig>,
}

impl<'a> TypeInferrer<'a> {
    pub fn new(config: Option<&'a TypeInferenceConfig>) -> Self {
        Self { config }
    }

    /// Determine the type of `name` holding `value`.
    pub fn infer(&self, name: &str, value: &str) -> VarType {
        if let Some(config) = self.config {
            if let Some(ty) = match_suffix(&config.exact, name) {
                return ty;
            }
            if let Some(ty) = match_suffix(&config.overrides, name) {
                return ty;
            }
        }

        if let Shape::Literal(ty) = infer_from_value(value) {
            return ty;
        }

        if let Some(config) = self.config {
            if let Some(pattern) = config
                .patterns
                .iter()
                .find(|p| name.contains(p.suffix_contains.as_str()))
            {
                return pattern.var_type.clone();
            }
        }

        infer_from_name(name)
    }
}

/// [`TypeInferrer::infer`] without a config.
pub fn infer_type(name: &str, value: &str) -> VarType {
    TypeInferrer::default().infer(name, value)
}

fn match_suffix<'t>(
    table: impl IntoIterator<Item = (&'t String, &'t VarType)>,
    name: &str,
) -> Option<VarType> {
    table
        .into_iter()
        .find(|(suffix, _)| name.ends_with(suffix.as_str()))
        .map(|(_, ty)| ty.clone())
}

fn infer_from_value(value: &str) -> Shape {
    if value.contains('\n') {
        let mut lines = value.split('\n');
        let first = lines.next().unwrap_or_default().trim();
        if first.is_empty() {
            if let Some(second) = lines.next().map(str::trim) {
                if second.starts_with('-') {
                    return Shape::Literal(VarType::List);
                }
                if second.contains(':') && !second.starts_with('#') {
                    return Shape::Literal(VarType::Dict);
                }
            }
        }
        if first.starts_with('-') {
            return Shape::Literal(VarType::List);
        }
    }

    let trimmed = value.trim();

    if matches!(trimmed, "" | "~" | "null") {
        return Shape::Literal(VarType::Null);
    }
    if matches!(trimmed, "\"\"" | "''") {
        return Shape::Literal(VarType::String);
    }
    if RE_BOOL.is_match(trimmed) {
        return Shape::Literal(VarType::Bool);
    }
    if RE_INT.is_match(trimmed) {
        return Shape::Literal(VarType::Int);
    }
    if RE_FLOAT.is_match(trimmed) {
        return Shape::Literal(VarType::Float);
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return Shape::Literal(VarType::List);
    }
    if trimmed.starts_with('{') && trimmed.ends_with('}') && !trimmed.starts_with("{{") {
        return Shape::Literal(VarType::Dict);
    }
    if trimmed.starts_with('-') {
        return Shape::Literal(VarType::List);
    }
    if trimmed.contains("{{") {
        return Shape::Opaque;
    }
    if trimmed.starts_with(['"', '\'']) {
        return Shape::Literal(VarType::String);
    }
    Shape::Opaque
}

fn infer_from_name(name: &str) -> VarType {
    let lower = name.to_lowercase();
    NAME_SUFFIX_RULES
        .iter()
        .find(|(suffixes, _)| suffixes.iter().any(|s| lower.ends_with(s)))
        .map(|(_, ty)| ty.clone())
        .unwrap_or(VarType::String)
}
