//! Role defaults parser: line-by-line state machine with lookahead.
//!
//! Recognizes, in priority order:
//!
//! 1. section headers: a `##########` run followed by `# Name` (and an
//!    optional closing run)
//! 2. `# Name - Sub-section Start`
//! 3. `# Name - Sub-section End`
//! 4. comment lines, with `[GLOBAL]` lines feeding a separate accumulator
//! 5. `name: value` definitions, followed by their continuation lines
//!
//! Anything else is ignored. Blank lines never break the link between a
//! comment block and the variable that follows it.

use super::value;
use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

// -- Regex patterns -----------------------------------------------------------

static RE_SECTION_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{10,}$").unwrap());

static RE_SECTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*(.+?)\s*$").unwrap());

static RE_SUBSECTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*(.+?)\s*-\s*Sub-section Start\s*$").unwrap());

static RE_SUBSECTION_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*(.+?)\s*-\s*Sub-section End\s*$").unwrap());

static RE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_]*)\s*:\s*(.*)$").unwrap());

static RE_SKIP_DOCS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Skip docs").unwrap());

static RE_SKIP_INVENTORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Do not edit or override using the inventory").unwrap()
});

static RE_GLOBAL_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[GLOBAL\]\s*").unwrap());

static RE_NOGLOBAL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[NOGLOBAL\]\s*").unwrap());

/// Banner titles that are file metadata rather than sections.
const META_SECTION_MARKERS: &[&str] = &[
    "title:",
    "author",
    "url:",
    "gnu general public license",
    "copyright",
];

/// Variables whose names contain this are derived folder lists.
const FOLDER_LIST_MARKER: &str = "_paths_folders_list";

const INSTANCES_SUFFIX: &str = "_instances";
const SSO_MIDDLEWARE_SUFFIX: &str = "_traefik_sso_middleware";
const SSO_DEFAULT_TOKEN: &str = "traefik_default_sso_middleware";
const THEMEPARK_INFIX: &str = "_themepark_";

// -- Parser state -------------------------------------------------------------

#[derive(Default)]
struct ParserState {
    current_section: String,
    current_subsection: String,
    pending_comment: String,
    global_comment: String,
    in_subsection: bool,
}

// -- Public API ---------------------------------------------------------------

/// Parse the text of a role's `defaults/main.yml`.
pub fn parse(input: &str, role_name: &str, repo_type: RepoType) -> RoleInfo {
    let lines: Vec<&str> = input.lines().collect();
    let mut role = RoleInfo::new(role_name, repo_type);
    let mut state = ParserState::default();

    let mut i = 0;
    while i < lines.len() {
        i = process_line(&mut state, &mut role, &lines, i);
    }

    debug!(
        role = role_name,
        sections = role.section_order.len(),
        variables = role.all_variables.len(),
        "parsed role defaults"
    );
    role
}

// -- Line processing ----------------------------------------------------------

/// Handle `lines[i]` and return the index of the next unconsumed line.
fn process_line(s: &mut ParserState, role: &mut RoleInfo, lines: &[&str], i: usize) -> usize {
    let line = lines[i];
    let trimmed = line.trim();

    // 6. Blank lines keep the pending comment
    if trimmed.is_empty() {
        return i + 1;
    }

    // 1. Section header
    if RE_SECTION_RULE.is_match(trimmed) {
        return process_section_header(s, role, lines, i);
    }

    // 2. Sub-section start
    if let Some(caps) = RE_SUBSECTION_START.captures(trimmed) {
        s.current_subsection = caps[1].to_string();
        s.in_subsection = true;
        s.pending_comment.clear();
        return i + 1;
    }

    // 3. Sub-section end
    if RE_SUBSECTION_END.is_match(trimmed) {
        s.current_subsection.clear();
        s.in_subsection = false;
        s.pending_comment.clear();
        s.global_comment.clear();
        return i + 1;
    }

    // 4. Comment
    if let Some(rest) = trimmed.strip_prefix('#') {
        let text = rest.trim();
        if RE_GLOBAL_TAG.is_match(text) {
            let text = RE_GLOBAL_TAG.replace(text, "");
            concat_str(&mut s.global_comment, &text);
        } else {
            concat_str(&mut s.pending_comment, text);
        }
        return i + 1;
    }

    // 5. Variable definition
    if let Some(caps) = RE_VARIABLE.captures(line) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let initial = caps.get(2).map_or("", |m| m.as_str());
        return process_variable(s, role, lines, i, name, initial);
    }

    i + 1
}

/// Open (or re-enter) a section. Returns the index after the header lines.
fn process_section_header(
    s: &mut ParserState,
    role: &mut RoleInfo,
    lines: &[&str],
    i: usize,
) -> usize {
    let mut next = i + 1;
    let Some(caps) = lines
        .get(next)
        .and_then(|l| RE_SECTION_NAME.captures(l.trim()))
    else {
        return next;
    };
    let title = caps[1].to_string();
    next += 1;

    // Closing rule
    if lines
        .get(next)
        .is_some_and(|l| RE_SECTION_RULE.is_match(l.trim()))
    {
        next += 1;
    }

    if is_meta_section(&title) {
        debug!(title = %title, "skipping metadata banner");
        return next;
    }

    s.current_section = title.clone();
    s.current_subsection.clear();
    s.in_subsection = false;
    s.pending_comment.clear();
    s.global_comment.clear();

    if !role.sections.contains_key(&title) {
        debug!(section = %title, "entering section");
        match title.to_lowercase().as_str() {
            "dns" => role.has_dns = true,
            "traefik" => role.has_traefik = true,
            "docker" => role.has_docker = true,
            "web" => role.has_web = true,
            _ => {}
        }
        role.section_order.push(title.clone());
        role.sections.insert(title.clone(), Section::new(title));
    }
    next
}

fn process_variable(
    s: &mut ParserState,
    role: &mut RoleInfo,
    lines: &[&str],
    i: usize,
    name: &str,
    initial: &str,
) -> usize {
    let collected = value::collect(lines, i, initial);

    if should_skip_variable(name, &s.pending_comment) {
        debug!(variable = name, line = i + 1, "excluding variable");
        s.pending_comment.clear();
        return collected.next;
    }

    let comment = effective_comment(&s.pending_comment, &s.global_comment);
    let raw_value = collected.raw();
    let next = collected.next;

    let variable = Variable {
        name: name.to_string(),
        raw_value,
        section: s.current_section.clone(),
        subsection: s.current_subsection.clone(),
        comment,
        is_multiline: collected.lines.len() > 1,
        value_lines: collected.lines,
        line_number: i + 1,
    };
    trace!(
        variable = name,
        line = variable.line_number,
        multiline = variable.is_multiline,
        "variable"
    );

    update_feature_flags(role, &variable);
    add_to_section(s, role, variable.clone());
    role.all_variables.push(variable);

    s.pending_comment.clear();
    next
}

// -- Helper functions ---------------------------------------------------------

fn add_to_section(s: &ParserState, role: &mut RoleInfo, variable: Variable) {
    if !role.sections.contains_key(&s.current_section) {
        // Variables ahead of the first header land in the unnamed section.
        role.section_order.push(s.current_section.clone());
        role.sections
            .insert(s.current_section.clone(), Section::new(s.current_section.clone()));
    }
    let Some(section) = role.sections.get_mut(&s.current_section) else {
        return;
    };

    if s.in_subsection && !s.current_subsection.is_empty() {
        if !section.subsections.contains_key(&s.current_subsection) {
            section.subsection_order.push(s.current_subsection.clone());
        }
        section
            .subsections
            .entry(s.current_subsection.clone())
            .or_default()
            .push(variable);
    } else {
        section.variables.push(variable);
    }
}

fn update_feature_flags(role: &mut RoleInfo, variable: &Variable) {
    let name = variable.name.as_str();

    if name.ends_with(INSTANCES_SUFFIX) {
        role.has_instances = true;
        role.instances_var = Some(name.to_string());
    }

    if name.ends_with("_default") || name.ends_with("_custom") {
        role.has_default_vars = true;
    }

    if name.ends_with(SSO_MIDDLEWARE_SUFFIX) && variable.raw_value.contains(SSO_DEFAULT_TOKEN) {
        role.sso_enabled = true;
    }

    if name.contains(THEMEPARK_INFIX) {
        role.has_themepark = true;
    }
}

/// Combine the pending and `[GLOBAL]` comments for a variable.
///
/// `[NOGLOBAL]` on the pending comment suppresses the global part.
fn effective_comment(pending: &str, global: &str) -> String {
    if RE_NOGLOBAL_TAG.is_match(pending) {
        return RE_NOGLOBAL_TAG.replace(pending, "").into_owned();
    }
    match (global.is_empty(), pending.is_empty()) {
        (false, false) => format!("{}\n{}", global, pending),
        (false, true) => global.to_string(),
        _ => pending.to_string(),
    }
}

fn is_meta_section(title: &str) -> bool {
    let lower = title.to_lowercase();
    META_SECTION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Whether a variable is excluded from the parsed model.
pub fn should_skip_variable(name: &str, pending_comment: &str) -> bool {
    name.contains(FOLDER_LIST_MARKER)
        || RE_SKIP_DOCS.is_match(pending_comment)
        || RE_SKIP_INVENTORY.is_match(pending_comment)
}

/// Append a line to an accumulator, newline-separated.
fn concat_str(dest: &mut String, text: &str) {
    if !dest.is_empty() {
        dest.push('\n');
    }
    dest.push_str(text);
}
