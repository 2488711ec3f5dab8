//! `role_var` lookups: classification and cross-reference scanning.
//!
//! Role values defer to user overrides through
//! `lookup('role_var', '<suffix>', ...)`. The suffix alone rarely carries a
//! literal, so its type is read from the suffix name and from the rest of
//! the line the call sits on.

use crate::error::{Error, Result};
use crate::types::VarType;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock};
use tracing::debug;

static RE_ROLE_VAR_LOOKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"lookup\s*\(\s*['"]role_var['"]\s*,\s*['"]([^'"]+)['"]"#).unwrap()
});

static RE_DEFAULT_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"default=['"]"#).unwrap());

static RE_DEFAULT_BOOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)default=(false|true)\b").unwrap());

static RE_DEFAULT_DICT_OMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"default=(\{\}|omit)").unwrap());

static RE_DEFAULT_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"default=\[\]").unwrap());

/// Suffix scanned → type.
pub type LookupTypes = BTreeMap<String, VarType>;

/// Classify a lookup suffix using its name and the source line around it.
pub fn classify(suffix: &str, line: &str) -> VarType {
    match suffix {
        "_depends_on_healthchecks" => return VarType::StringTrueFalse,
        "_depends_on_delay" => return VarType::StringNumber,
        "_depends_on" => return VarType::String,
        _ => {}
    }

    if suffix.contains("_scheme") {
        return VarType::StringHttpHttps;
    }
    if suffix.contains("_enabled") || suffix.contains("_proxy") {
        return VarType::Bool;
    }
    if ["_domain", "_subdomain", "_url"]
        .iter()
        .any(|p| suffix.contains(p))
    {
        return VarType::String;
    }
    if suffix.contains("_port") || suffix.contains("_timeout") {
        return VarType::StringNumber;
    }

    if line.contains("| bool") {
        VarType::Bool
    } else if RE_DEFAULT_QUOTED.is_match(line) {
        VarType::String
    } else if RE_DEFAULT_BOOL.is_match(line) {
        VarType::Bool
    } else if RE_DEFAULT_DICT_OMIT.is_match(line) {
        VarType::DictOmit
    } else if RE_DEFAULT_LIST.is_match(line) {
        VarType::List
    } else {
        VarType::String
    }
}

/// Distinct lookup suffixes in `value`, in first-seen order.
pub fn extract_lookups(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    RE_ROLE_VAR_LOOKUP
        .captures_iter(value)
        .map(|caps| caps[1].to_string())
        .filter(|suffix| seen.insert(suffix.clone()))
        .collect()
}

/// Scan text line by line for lookups and classify every suffix found.
///
/// A `string` result is replaced by a later, more specific one; any other
/// result is kept.
pub fn scan_text(text: &str, ignore_suffixes: &[String]) -> LookupTypes {
    let ignore: HashSet<&str> = ignore_suffixes.iter().map(String::as_str).collect();
    let mut lookups = LookupTypes::new();

    for line in text.lines() {
        for caps in RE_ROLE_VAR_LOOKUP.captures_iter(line) {
            let suffix = &caps[1];
            if ignore.contains(suffix) {
                continue;
            }
            let ty = classify(suffix, line);
            match lookups.get(suffix) {
                Some(existing) if !existing.is_generic_string() => {}
                _ => {
                    lookups.insert(suffix.to_string(), ty);
                }
            }
        }
    }
    lookups
}

/// [`scan_text`] over a file. A missing file yields an empty map.
pub fn scan_file(path: &Path, ignore_suffixes: &[String]) -> Result<LookupTypes> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let lookups = scan_text(&text, ignore_suffixes);
            debug!(path = %path.display(), found = lookups.len(), "scanned role_var lookups");
            Ok(lookups)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no inventory file to scan");
            Ok(LookupTypes::new())
        }
        Err(source) => Err(Error::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Scans one auxiliary file once and serves the cached result afterwards.
#[derive(Debug)]
pub struct LookupScanner {
    path: PathBuf,
    ignore_suffixes: Vec<String>,
    cache: OnceLock<LookupTypes>,
}

impl LookupScanner {
    pub fn new(path: impl Into<PathBuf>, ignore_suffixes: Vec<String>) -> Self {
        Self {
            path: path.into(),
            ignore_suffixes,
            cache: OnceLock::new(),
        }
    }

    /// Lookups found in the file, scanning it on first use.
    pub fn lookups(&self) -> Result<&LookupTypes> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }
        let scanned = scan_file(&self.path, &self.ignore_suffixes)?;
        Ok(self.cache.get_or_init(|| scanned))
    }
}
