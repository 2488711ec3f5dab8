//! GitHub-flavored markdown renderer.
//!
//! One heading per section and sub-section, each followed by a YAML block
//! that reproduces the definitions with their comments and type annotation.
//! Instance-capable roles get a second block with the renamed definitions.

use crate::render::Renderer;
use crate::report::*;
use crate::types::VarType;
use anyhow::Result;

pub struct MarkdownRenderer;

/// Heading used for variables defined ahead of the first section header.
const UNNAMED_SECTION: &str = "General";

impl Renderer for MarkdownRenderer {
    fn render(&self, report: &RoleReport) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!("# {}\n", report.name));

        if report.has_default_vars {
            lines.push(
                "Variables ending in `_default` hold the role's values; add to them through the \
                 matching `_custom` variable instead of replacing them.\n"
                    .to_string(),
            );
        }

        for section in &report.sections {
            if section.variables.is_empty()
                && section.subsections.iter().all(|s| s.variables.is_empty())
            {
                continue;
            }
            let title = if section.name.is_empty() {
                UNNAMED_SECTION
            } else {
                section.name.as_str()
            };
            lines.push(format!("## {}\n", title));
            render_variables(&mut lines, &section.variables, report.instance.as_deref());

            for sub in &section.subsections {
                if sub.variables.is_empty() {
                    continue;
                }
                lines.push(format!("### {}\n", sub.name));
                render_variables(&mut lines, &sub.variables, report.instance.as_deref());
            }
        }

        if !report.role_var_lookups.is_empty() {
            lines.push("## Global Override Options\n".to_string());
            lines.push("| Variable | Type | Accepts |".to_string());
            lines.push("| --- | --- | --- |".to_string());
            for (suffix, ty) in &report.role_var_lookups {
                lines.push(format!(
                    "| `{}_role{}` | {} | {} |",
                    report.name,
                    suffix,
                    ty.keyword(),
                    qualifier(ty)
                ));
            }
            lines.push(String::new());
        }

        if !report.docker_options.is_empty() {
            lines.push("## Docker+ Options\n".to_string());
            for category in &report.docker_options {
                lines.push(format!("### {}\n", category.name));
                lines.push("```yaml".to_string());
                for (i, option) in category.options.iter().enumerate() {
                    if i > 0 {
                        lines.push(String::new());
                    }
                    if !option.type_comment.is_empty() {
                        lines.push(option.type_comment.clone());
                    }
                    lines.push(format!("{}_role_docker_{}:", report.name, option.suffix));
                }
                lines.push("```\n".to_string());
            }
        }

        let mut out = lines.join("\n");
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

fn render_variables(lines: &mut Vec<String>, vars: &[VariableReport], instance: Option<&str>) {
    if vars.is_empty() {
        return;
    }
    yaml_block(lines, vars, |v| v.definition.as_slice());

    if let Some(instance) = instance {
        lines.push(format!("Instance-level (`{}`):\n", instance));
        yaml_block(lines, vars, |v| {
            v.instance_definition.as_deref().unwrap_or(&v.definition)
        });
    }
}

fn yaml_block<'a>(
    lines: &mut Vec<String>,
    vars: &'a [VariableReport],
    definition: impl Fn(&'a VariableReport) -> &'a [String],
) {
    lines.push("```yaml".to_string());
    for (i, var) in vars.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        for comment in var.comment.lines() {
            lines.push(comment_line(comment));
        }
        if !var.type_comment.is_empty() {
            lines.push(var.type_comment.clone());
        }
        lines.extend(definition(var).iter().cloned());
    }
    lines.push("```\n".to_string());
}

/// Label text past the keyword: `string (http/https)` → `(http/https)`.
fn qualifier(ty: &VarType) -> &str {
    ty.label()
        .strip_prefix(ty.keyword())
        .map(str::trim)
        .unwrap_or_default()
}

fn comment_line(text: &str) -> String {
    if text.is_empty() {
        "#".to_string()
    } else {
        format!("# {}", text)
    }
}
