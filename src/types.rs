//! Variable type taxonomy.
//!
//! Every category has a canonical label (`"bool"`, `"string (number)"`, ...)
//! which is what configuration files use and what renderers print.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime category of a role variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum VarType {
    Bool,
    Int,
    Float,
    String,
    List,
    Dict,
    /// Literal `~`, `null` or an empty value.
    Null,
    /// Mapping that is normally left out (`default={}` / `default=omit`).
    DictOmit,
    /// String restricted to `"true"` / `"false"`.
    StringTrueFalse,
    /// String holding a quoted number (ports, timeouts).
    StringNumber,
    /// String restricted to `"http"` / `"https"`.
    StringHttpHttps,
    /// Label from configuration that is not one of the built-in categories.
    Custom(String),
}

impl VarType {
    /// Canonical label.
    pub fn label(&self) -> &str {
        match self {
            VarType::Bool => "bool",
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::String => "string",
            VarType::List => "list",
            VarType::Dict => "dict",
            VarType::Null => "null",
            VarType::DictOmit => "dict/omit",
            VarType::StringTrueFalse => "string (true/false)",
            VarType::StringNumber => "string (number)",
            VarType::StringHttpHttps => "string (http/https)",
            VarType::Custom(label) => label,
        }
    }

    /// Human-readable annotation rendered above a variable.
    pub fn type_comment(&self) -> String {
        match self {
            VarType::Bool => "# Type: bool (true/false)".to_string(),
            VarType::StringTrueFalse => r#"# Type: string ("true"/"false")"#.to_string(),
            VarType::StringNumber => "# Type: string (quoted number)".to_string(),
            VarType::StringHttpHttps => r#"# Type: string ("http"/"https")"#.to_string(),
            VarType::Custom(label) if label.is_empty() => String::new(),
            other => format!("# Type: {}", other.label()),
        }
    }

    /// Bare keyword: the label up to the first space or parenthesis.
    ///
    /// `"string (number)"` → `"string"`, `"dict/omit"` → `"dict/omit"`.
    pub fn keyword(&self) -> &str {
        let label = self.label();
        if label.is_empty() {
            return "string";
        }
        match label.find([' ', '(']) {
            Some(end) => &label[..end],
            None => label,
        }
    }

    /// True for the generic string category only (qualified strings excluded).
    pub fn is_generic_string(&self) -> bool {
        matches!(self, VarType::String)
    }
}

impl From<&str> for VarType {
    fn from(label: &str) -> Self {
        match label.trim() {
            "bool" | "bool (true/false)" => VarType::Bool,
            "int" => VarType::Int,
            "float" => VarType::Float,
            "string" => VarType::String,
            "list" => VarType::List,
            "dict" => VarType::Dict,
            "null" => VarType::Null,
            "dict/omit" => VarType::DictOmit,
            "string (true/false)" => VarType::StringTrueFalse,
            "string (number)" => VarType::StringNumber,
            "string (http/https)" => VarType::StringHttpHttps,
            other => VarType::Custom(other.to_string()),
        }
    }
}

impl From<String> for VarType {
    fn from(label: String) -> Self {
        VarType::from(label.as_str())
    }
}

impl From<VarType> for String {
    fn from(ty: VarType) -> Self {
        ty.label().to_string()
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
