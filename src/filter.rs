//! Post-parse filtering and role → instance renaming.

use crate::model::Variable;
use std::collections::HashSet;

const OVERRIDE_SUFFIXES: &[&str] = &["_default", "_custom"];

const INTERNAL_MARKERS: &[&str] = &["_lookup", "_dict", "_proxy_dict", "_network_modes"];

/// Base names that have a `_default` and/or `_custom` sibling.
///
/// `role_docker_envs_default` hides `role_docker_envs`.
pub fn hide_base_set(variables: &[Variable]) -> HashSet<String> {
    variables
        .iter()
        .filter_map(|v| {
            OVERRIDE_SUFFIXES
                .iter()
                .find_map(|suffix| v.name.strip_suffix(suffix))
        })
        .map(str::to_string)
        .collect()
}

/// Variables with hide-pair bases removed.
pub fn filter_variables(variables: &[Variable]) -> Vec<Variable> {
    let hidden = hide_base_set(variables);
    visible(variables, &hidden).cloned().collect()
}

/// Variables not named in `hidden`.
///
/// `hidden` is usually the [`hide_base_set`] of the whole file, so a
/// section slice can be filtered against pairs defined elsewhere.
pub fn visible<'a>(
    variables: &'a [Variable],
    hidden: &'a HashSet<String>,
) -> impl Iterator<Item = &'a Variable> + 'a {
    variables.iter().filter(move |v| !hidden.contains(&v.name))
}

/// Names that are plumbing rather than user-facing settings.
pub fn is_internal_variable(name: &str) -> bool {
    INTERNAL_MARKERS.iter().any(|m| name.contains(m))
}

/// Rewrite a role-scoped name into its instance-scoped form.
///
/// `plex_role_web_subdomain` → `plex2_web_subdomain`,
/// `plex_name` → `plex2_name`; `plex_instances` is left alone.
pub fn instance_name(var_name: &str, role_name: &str, instance: &str) -> String {
    if let Some(suffix) = var_name.strip_prefix(&format!("{}_role_", role_name)) {
        return format!("{}_{}", instance, suffix);
    }
    match var_name.strip_prefix(&format!("{}_", role_name)) {
        Some("instances") | None => var_name.to_string(),
        Some(suffix) => format!("{}_{}", instance, suffix),
    }
}

/// Re-indent continuation lines after a variable is renamed.
///
/// The first line gets `new_name` in place of `original_name`; every later
/// non-blank line shifts by the change in name length, never below zero.
pub fn adjust_multiline_indent<S: AsRef<str>>(
    lines: &[S],
    original_name: &str,
    new_name: &str,
) -> Vec<String> {
    let diff = new_name.len() as isize - original_name.len() as isize;
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let line = line.as_ref();
            if i == 0 {
                return line.replacen(original_name, new_name, 1);
            }
            let body = line.trim_start_matches([' ', '\t']);
            if diff == 0 || body.is_empty() {
                return line.to_string();
            }
            let indent = (line.len() - body.len()) as isize;
            let width = (indent + diff).max(0) as usize;
            format!("{}{}", " ".repeat(width), body)
        })
        .collect()
}
