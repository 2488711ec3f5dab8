//! Multi-line value reconstruction.
//!
//! Given the line index of a `name: value` definition, collect the lines
//! that belong to its value. Three shapes are recognized, checked in this
//! order against the trimmed first-line value:
//!
//! - **block scalar**: empty, `|`, `>`, `|-` or `>-`
//! - **flow collection**: ends with `[` or `{`
//! - **bare continuation**: anything else (wrapped quoted strings and
//!   templating expressions)
//!
//! Continuation lines are returned exactly as they appear in the file.

const BLOCK_INDICATORS: &[&str] = &["", "|", ">", "|-", ">-"];

/// Lines making up one variable's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedValue {
    pub lines: Vec<String>,
    /// Index of the first line after the value.
    pub next: usize,
}

impl CollectedValue {
    /// Lines joined back into the raw value.
    pub fn raw(&self) -> String {
        self.lines.join("\n")
    }
}

/// Collect the value starting at `lines[start]`, whose value portion is `initial`.
pub fn collect(lines: &[&str], start: usize, initial: &str) -> CollectedValue {
    let mut value_lines = vec![initial.to_string()];
    let trimmed = initial.trim();

    let next = if BLOCK_INDICATORS.contains(&trimmed) {
        collect_block(lines, start + 1, &mut value_lines)
    } else if let Some(close) = flow_closer(trimmed) {
        collect_flow(lines, start + 1, close, &mut value_lines)
    } else {
        collect_bare(lines, start + 1, lines[start], &mut value_lines)
    };

    CollectedValue {
        lines: value_lines,
        next,
    }
}

fn collect_block(lines: &[&str], mut i: usize, out: &mut Vec<String>) -> usize {
    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            // A blank line belongs to the block only if the block resumes after it.
            let resumes = lines[i + 1..]
                .iter()
                .find(|l| !l.is_empty())
                .is_some_and(|l| starts_indented(l));
            if !resumes {
                break;
            }
            out.push(String::new());
        } else if starts_indented(line) {
            out.push(line.to_string());
        } else {
            break;
        }
        i += 1;
    }
    i
}

fn collect_flow(lines: &[&str], mut i: usize, close: char, out: &mut Vec<String>) -> usize {
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();
        if trimmed.is_empty() || !starts_indented(line) {
            break;
        }
        out.push(line.to_string());
        i += 1;
        if trimmed.ends_with(close) {
            break;
        }
    }
    i
}

fn collect_bare(lines: &[&str], mut i: usize, defining: &str, out: &mut Vec<String>) -> usize {
    while i < lines.len() {
        let line = lines[i];
        if !starts_indented(line) {
            break;
        }
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            break;
        }
        if looks_like_key(trimmed) && indent_width(line) <= indent_width(defining) {
            break;
        }
        out.push(line.to_string());
        i += 1;
    }
    i
}

/// `key: value` shape that is not a list item or the start of a quoted string.
fn looks_like_key(trimmed: &str) -> bool {
    trimmed.contains(':')
        && !trimmed.starts_with('-')
        && !trimmed.starts_with('"')
        && !trimmed.starts_with('\'')
}

fn flow_closer(trimmed: &str) -> Option<char> {
    if trimmed.ends_with('[') {
        Some(']')
    } else if trimmed.ends_with('{') {
        Some('}')
    } else {
        None
    }
}

fn starts_indented(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

/// Width of the leading space/tab run, one column per character.
fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}
