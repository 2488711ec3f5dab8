//! Typed view of a parsed role, ready for rendering.
//!
//! Joins the untyped parse result with type inference, hide-pair
//! filtering, instance renaming and the cross-reference scans.

use crate::config::Config;
use crate::docker::{self, DockerVarScanner};
use crate::error::Result;
use crate::filter;
use crate::inference::TypeInferrer;
use crate::lookup::{self, LookupTypes};
use crate::model::{RepoType, RoleInfo, Variable};
use crate::types::VarType;
use serde::Serialize;
use std::collections::HashSet;

/// Optional inputs beyond the parsed role.
#[derive(Debug, Default)]
pub struct ReportOptions<'a> {
    /// Instance name used for renamed examples; defaults to `<role>2`.
    pub instance: Option<String>,
    /// Lookups scanned from the shared inventory.
    pub inventory_lookups: Option<&'a LookupTypes>,
    pub docker: Option<&'a DockerVarScanner>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleReport {
    pub name: String,
    pub repo_type: RepoType,
    /// Set when the role supports multiple instances.
    pub instance: Option<String>,
    pub instances_var: Option<String>,
    pub has_default_vars: bool,
    pub sso_enabled: bool,
    pub has_dns: bool,
    pub has_traefik: bool,
    pub has_docker: bool,
    pub has_web: bool,
    pub has_themepark: bool,
    pub sections: Vec<SectionReport>,
    /// Override suffixes reachable through `role_var` lookups.
    pub role_var_lookups: LookupTypes,
    pub docker_options: Vec<DockerCategory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub name: String,
    pub variables: Vec<VariableReport>,
    pub subsections: Vec<SubsectionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsectionReport {
    pub name: String,
    pub variables: Vec<VariableReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableReport {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    pub type_comment: String,
    pub comment: String,
    pub line_number: usize,
    pub internal: bool,
    /// `name: value` followed by continuation lines, as in the file.
    pub definition: Vec<String>,
    pub instance_name: Option<String>,
    /// `definition` renamed and re-indented for the instance.
    pub instance_definition: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DockerCategory {
    pub name: &'static str,
    pub options: Vec<DockerOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DockerOption {
    pub suffix: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    pub type_comment: String,
}

impl RoleReport {
    /// Number of variables that will be documented.
    pub fn variable_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| {
                s.variables.len() + s.subsections.iter().map(|sub| sub.variables.len()).sum::<usize>()
            })
            .sum()
    }
}

/// Build the report for `role`.
pub fn build(role: &RoleInfo, config: &Config, options: &ReportOptions) -> Result<RoleReport> {
    let inferrer = TypeInferrer::new(Some(&config.type_inference));
    let hidden = filter::hide_base_set(&role.all_variables);
    let instance = role.has_instances.then(|| {
        options
            .instance
            .clone()
            .unwrap_or_else(|| format!("{}2", role.name))
    });

    let ctx = VariableContext {
        role_name: &role.name,
        instance: instance.as_deref(),
        inferrer,
        hidden: &hidden,
    };

    let mut lookups = LookupTypes::new();
    let mut sections = Vec::new();
    for section in role.ordered_sections() {
        let variables = ctx.build_all(&section.variables, &mut lookups);
        let subsections = section
            .ordered_subsections()
            .map(|(name, vars)| SubsectionReport {
                name: name.to_string(),
                variables: ctx.build_all(vars, &mut lookups),
            })
            .collect();
        sections.push(SectionReport {
            name: section.name.clone(),
            variables,
            subsections,
        });
    }

    if let Some(inventory) = options.inventory_lookups {
        for (suffix, ty) in inventory {
            lookups.entry(suffix.clone()).or_insert_with(|| ty.clone());
        }
    }

    let docker_options = match options.docker {
        Some(scanner) => docker_options(role, scanner, &config.docker_overrides.ignore_suffixes)?,
        None => Vec::new(),
    };

    Ok(RoleReport {
        name: role.name.clone(),
        repo_type: role.repo_type,
        instance,
        instances_var: role.instances_var.clone(),
        has_default_vars: role.has_default_vars,
        sso_enabled: role.sso_enabled,
        has_dns: role.has_dns,
        has_traefik: role.has_traefik,
        has_docker: role.has_docker,
        has_web: role.has_web,
        has_themepark: role.has_themepark,
        sections,
        role_var_lookups: lookups,
        docker_options,
    })
}

struct VariableContext<'a> {
    role_name: &'a str,
    instance: Option<&'a str>,
    inferrer: TypeInferrer<'a>,
    hidden: &'a HashSet<String>,
}

impl VariableContext<'_> {
    fn build_all(&self, vars: &[Variable], lookups: &mut LookupTypes) -> Vec<VariableReport> {
        filter::visible(vars, self.hidden)
            .map(|v| {
                for suffix in lookup::extract_lookups(&v.raw_value) {
                    lookups
                        .entry(suffix.clone())
                        .or_insert_with(|| lookup::classify(&suffix, &v.raw_value));
                }
                self.build(v)
            })
            .collect()
    }

    fn build(&self, v: &Variable) -> VariableReport {
        let var_type = self.inferrer.infer(&v.name, &v.raw_value);
        let definition = definition_lines(v);
        let (instance_name, instance_definition) = match self.instance {
            Some(instance) => {
                let renamed = filter::instance_name(&v.name, self.role_name, instance);
                let lines = if aligned_to_key(v) {
                    filter::adjust_multiline_indent(&definition, &v.name, &renamed)
                } else {
                    rename_head(&definition, &v.name, &renamed)
                };
                (Some(renamed), Some(lines))
            }
            None => (None, None),
        };

        VariableReport {
            name: v.name.clone(),
            type_comment: var_type.type_comment(),
            var_type,
            comment: v.comment.clone(),
            line_number: v.line_number,
            internal: filter::is_internal_variable(&v.name),
            definition,
            instance_name,
            instance_definition,
        }
    }
}

fn definition_lines(v: &Variable) -> Vec<String> {
    let first = v.value_lines.first().map(String::as_str).unwrap_or_default();
    let head = if first.is_empty() {
        format!("{}:", v.name)
    } else {
        format!("{}: {}", v.name, first)
    };
    std::iter::once(head)
        .chain(v.value_lines.iter().skip(1).cloned())
        .collect()
}

/// Continuation lines of inline values line up with the text after
/// `name: `; block collections and block scalars are indented from column 0.
fn aligned_to_key(v: &Variable) -> bool {
    v.is_multiline
        && v.value_lines
            .first()
            .map(|first| first.trim())
            .is_some_and(|first| !matches!(first, "" | "|" | ">" | "|-" | ">-"))
}

fn rename_head(lines: &[String], original: &str, renamed: &str) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.replacen(original, renamed, 1)
            } else {
                line.clone()
            }
        })
        .collect()
}

fn docker_options(
    role: &RoleInfo,
    scanner: &DockerVarScanner,
    ignore_suffixes: &[String],
) -> Result<Vec<DockerCategory>> {
    let role_docker_vars: Vec<&str> = role
        .all_variables
        .iter()
        .map(|v| v.name.as_str())
        .filter(|name| name.contains("_docker_"))
        .collect();
    if role_docker_vars.is_empty() {
        return Ok(Vec::new());
    }

    let extra = scanner.additional_suffixes(&role.name, &role_docker_vars, ignore_suffixes)?;
    let mut groups = docker::categorize(&extra);
    Ok(docker::CATEGORY_ORDER
        .iter()
        .filter_map(|name| groups.remove(name).map(|suffixes| (*name, suffixes)))
        .map(|(name, suffixes)| DockerCategory {
            name,
            options: suffixes
                .into_iter()
                .map(|suffix| {
                    let var_type = docker::option_type(&suffix);
                    DockerOption {
                        type_comment: var_type.type_comment(),
                        var_type,
                        suffix,
                    }
                })
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use pretty_assertions::assert_eq;

    const DEFAULTS: &str = "\
##########
# Basics
##########

plex_instances: [\"plex\"]

##########
# Docker
##########

# Extra envs
plex_role_docker_envs_default:
  PLEX_UID: \"{{ uid }}\"
plex_role_docker_envs_custom: {}
plex_role_docker_envs: \"{{ lookup('role_var', '_docker_envs_default', role='plex')
                        | combine(lookup('role_var', '_docker_envs_custom', role='plex')) }}\"
plex_role_web_scheme: \"{{ lookup('role_var', '_web_scheme', default='https') }}\"
";

    fn report(options: &ReportOptions) -> RoleReport {
        let role = parser::parse(DEFAULTS, "plex", RepoType::Saltbox);
        build(&role, &Config::default(), options).unwrap()
    }

    #[test]
    fn hides_base_and_types_variables() {
        let r = report(&ReportOptions::default());
        let docker = &r.sections[1];
        let names: Vec<_> = docker.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "plex_role_docker_envs_default",
                "plex_role_docker_envs_custom",
                "plex_role_web_scheme"
            ]
        );
        assert_eq!(docker.variables[0].var_type, VarType::Dict);
        assert_eq!(docker.variables[0].comment, "Extra envs");
        assert_eq!(docker.variables[2].var_type, VarType::StringHttpHttps);
        assert_eq!(r.variable_count(), 4);
    }

    #[test]
    fn instance_definitions_are_renamed() {
        let r = report(&ReportOptions::default());
        assert_eq!(r.instance.as_deref(), Some("plex2"));
        let v = &r.sections[1].variables[0];
        assert_eq!(v.instance_name.as_deref(), Some("plex2_docker_envs_default"));
        assert_eq!(
            v.instance_definition.as_deref(),
            Some(&["plex2_docker_envs_default:".to_string(), "  PLEX_UID: \"{{ uid }}\"".to_string()][..])
        );
        let instances = &r.sections[0].variables[0];
        assert_eq!(instances.instance_name.as_deref(), Some("plex_instances"));
    }

    #[test]
    fn inline_continuations_shift_with_the_name() {
        let input = "plex_instances: []\nplex_role_thing: \"{{ a\n                  | b }}\"\n";
        let role = parser::parse(input, "plex", RepoType::Saltbox);
        let r = build(&role, &Config::default(), &ReportOptions::default()).unwrap();
        let v = &r.sections[0].variables[1];
        assert_eq!(v.definition[0], "plex_role_thing: \"{{ a");
        assert_eq!(
            v.instance_definition.as_deref(),
            Some(&["plex2_thing: \"{{ a".to_string(), "              | b }}\"".to_string()][..])
        );
    }

    #[test]
    fn custom_instance_name() {
        let r = report(&ReportOptions {
            instance: Some("plex4k".to_string()),
            ..Default::default()
        });
        assert_eq!(r.instance.as_deref(), Some("plex4k"));
        assert_eq!(
            r.sections[1].variables[2].instance_name.as_deref(),
            Some("plex4k_web_scheme")
        );
    }

    #[test]
    fn lookups_from_values_take_precedence_over_inventory() {
        let mut inventory = LookupTypes::new();
        inventory.insert("_web_scheme".to_string(), VarType::String);
        inventory.insert("_dns_proxy".to_string(), VarType::Bool);
        let r = report(&ReportOptions {
            inventory_lookups: Some(&inventory),
            ..Default::default()
        });
        assert_eq!(r.role_var_lookups["_web_scheme"], VarType::StringHttpHttps);
        assert_eq!(r.role_var_lookups["_dns_proxy"], VarType::Bool);
        assert!(!r.role_var_lookups.contains_key("_docker_envs_default"));
    }

    #[test]
    fn docker_options_grouped_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = dir.path().join("tasks").join("docker");
        std::fs::create_dir_all(&tasks).unwrap();
        std::fs::write(
            tasks.join("create.yml"),
            "a: \"{{ lookup('docker_var', '_docker_envs') }}\"\n\
             b: \"{{ lookup('docker_var', '_docker_memory') }}\"\n\
             c: \"{{ lookup('docker_var', '_docker_privileged') }}\"\n",
        )
        .unwrap();
        let scanner = DockerVarScanner::new(dir.path());
        let r = report(&ReportOptions {
            docker: Some(&scanner),
            ..Default::default()
        });
        let names: Vec<_> = r.docker_options.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Resource Limits", "Security & Devices"]);
        assert_eq!(r.docker_options[1].options[0].var_type, VarType::Bool);
    }
}
