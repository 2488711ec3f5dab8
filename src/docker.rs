//! Docker container options available to every role.
//!
//! The shared container task files (`<resources>/tasks/docker/*.yml`) read
//! options through `lookup('docker_var', '_docker_<suffix>')` and declare
//! them in `_docker_var_specs` mappings. Options found there that a role
//! does not define itself are documented as additional knobs.

use crate::error::{Error, Result};
use crate::types::VarType;
use regex::Regex;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock};
use tracing::{debug, warn};

static RE_DOCKER_VAR_LOOKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"lookup\s*\(\s*['"]docker_var['"]\s*,\s*['"]([^'"]+)['"]"#).unwrap()
});

const SPECS_KEY: &str = "_docker_var_specs";
const DOCKER_PREFIX: &str = "_docker_";

/// Display order of option categories.
pub const CATEGORY_ORDER: &[&str] = &[
    "Resource Limits",
    "Security & Devices",
    "Networking",
    "Storage",
    "Monitoring & Lifecycle",
    "Other Options",
];

/// Category → substrings that select it, first match wins.
const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("Resource Limits", &["cpu", "memory", "blkio", "kernel", "shm"]),
    (
        "Security & Devices",
        &[
            "device", "cap_", "privileged", "security", "user", "groups", "userns", "cgroupns",
        ],
    ),
    (
        "Networking",
        &[
            "network", "dns", "hostname", "hosts", "domainname", "ports", "exposed", "links",
            "ipc", "pid", "uts",
        ],
    ),
    ("Storage", &["volume", "mount", "working_dir", "tmpfs", "storage"]),
    (
        "Monitoring & Lifecycle",
        &[
            "log", "healthcheck", "init", "restart", "stop", "kill", "recreate", "cleanup",
            "keep", "oom", "paused", "detach", "output", "auto_remove", "healthy",
        ],
    ),
];

const BOOL_OPTIONS: &[&str] = &[
    "auto_remove", "cleanup", "detach", "init", "keep_volumes", "oom_killer", "output_logs",
    "paused", "privileged", "read_only", "recreate", "image_pull", "hosts_use_common",
    "labels_use_common", "volumes_global",
];

const INT_OPTIONS: &[&str] = &[
    "blkio_weight", "cpu_period", "cpu_quota", "cpu_shares", "healthy_wait_timeout",
    "memory_swappiness", "oom_score_adj", "restart_retries", "stop_timeout", "create_timeout",
];

const LIST_OPTIONS: &[&str] = &[
    "capabilities", "cap_drop", "commands", "device_cgroup_rules", "device_read_bps",
    "device_read_iops", "device_requests", "device_write_bps", "device_write_iops", "devices",
    "dns_opts", "dns_search_domains", "dns_servers", "exposed_ports", "groups", "links",
    "mounts", "networks", "ports", "security_opts", "sysctls", "tmpfs", "ulimits", "volumes",
    "volumes_from",
];

const DICT_OPTIONS: &[&str] = &["envs", "healthcheck", "hosts", "labels", "log_options", "storage_opts"];

/// Strip surrounding whitespace and a leading `_docker_` (or bare `_`).
pub fn normalize_suffix(suffix: &str) -> String {
    let trimmed = suffix.trim();
    trimmed
        .strip_prefix(DOCKER_PREFIX)
        .or_else(|| trimmed.strip_prefix('_'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Type of a container option, per the docker_container module.
pub fn option_type(suffix: &str) -> VarType {
    if BOOL_OPTIONS.contains(&suffix) {
        VarType::Bool
    } else if INT_OPTIONS.contains(&suffix) {
        VarType::Int
    } else if LIST_OPTIONS.contains(&suffix) {
        VarType::List
    } else if DICT_OPTIONS.contains(&suffix) {
        VarType::Dict
    } else {
        VarType::String
    }
}

/// Category an option is listed under.
pub fn category(suffix: &str) -> &'static str {
    CATEGORY_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| suffix.contains(n)))
        .map(|(name, _)| *name)
        .unwrap_or("Other Options")
}

/// Group suffixes by [`category`], keeping input order inside each group.
pub fn categorize<S: AsRef<str>>(suffixes: &[S]) -> BTreeMap<&'static str, Vec<String>> {
    let mut groups: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for suffix in suffixes {
        let suffix = suffix.as_ref();
        groups
            .entry(category(suffix))
            .or_default()
            .push(suffix.to_string());
    }
    groups
}

/// Scans the shared docker task files once per instance.
#[derive(Debug)]
pub struct DockerVarScanner {
    resources_path: PathBuf,
    cache: OnceLock<BTreeSet<String>>,
}

impl DockerVarScanner {
    pub fn new(resources_path: impl Into<PathBuf>) -> Self {
        Self {
            resources_path: resources_path.into(),
            cache: OnceLock::new(),
        }
    }

    /// Every option suffix (without `_docker_`) found in the task files.
    pub fn suffixes(&self) -> Result<&BTreeSet<String>> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }
        let scanned = scan_tasks_dir(&self.resources_path.join("tasks").join("docker"))?;
        Ok(self.cache.get_or_init(|| scanned))
    }

    /// Options the role does not define as `{role}_role_docker_{suffix}`,
    /// minus `ignore_suffixes`, sorted.
    pub fn additional_suffixes<S: AsRef<str>>(
        &self,
        role_name: &str,
        role_docker_vars: &[S],
        ignore_suffixes: &[String],
    ) -> Result<Vec<String>> {
        let prefix = format!("{}_role_docker_", role_name);
        let defined: HashSet<&str> = role_docker_vars
            .iter()
            .filter_map(|name| name.as_ref().strip_prefix(prefix.as_str()))
            .collect();
        let ignored: HashSet<String> = ignore_suffixes
            .iter()
            .map(|s| normalize_suffix(s))
            .filter(|s| !s.is_empty())
            .collect();

        Ok(self
            .suffixes()?
            .iter()
            .filter(|s| !defined.contains(s.as_str()) && !ignored.contains(*s))
            .cloned()
            .collect())
    }
}

fn scan_tasks_dir(dir: &Path) -> Result<BTreeSet<String>> {
    let mut found = BTreeSet::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "no docker task directory");
            return Ok(found);
        }
        Err(source) => {
            return Err(Error::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("yml") {
            continue;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable docker task file");
                continue;
            }
        };
        collect_suffixes(&content, &mut found);
    }

    debug!(dir = %dir.display(), found = found.len(), "scanned docker options");
    Ok(found)
}

/// Add suffixes from lookup calls and `_docker_var_specs` keys in one file.
fn collect_suffixes(content: &str, found: &mut BTreeSet<String>) {
    for caps in RE_DOCKER_VAR_LOOKUP.captures_iter(content) {
        let suffix = normalize_suffix(&caps[1]);
        if !suffix.is_empty() {
            found.insert(suffix);
        }
    }

    match serde_yaml::from_str::<Value>(content) {
        Ok(root) => collect_spec_keys(&root, found),
        Err(e) => debug!(error = %e, "docker task file is not plain YAML"),
    }
}

fn collect_spec_keys(node: &Value, found: &mut BTreeSet<String>) {
    match node {
        Value::Sequence(items) => {
            for item in items {
                collect_spec_keys(item, found);
            }
        }
        Value::Mapping(map) => {
            for (key, value) in map {
                if key.as_str() == Some(SPECS_KEY) {
                    if let Value::Mapping(specs) = value {
                        let suffixes = specs
                            .keys()
                            .filter_map(Value::as_str)
                            .filter_map(|k| k.strip_prefix(DOCKER_PREFIX))
                            .filter(|s| !s.is_empty());
                        found.extend(suffixes.map(str::to_string));
                    }
                }
                collect_spec_keys(value, found);
            }
        }
        Value::Tagged(tagged) => collect_spec_keys(&tagged.value, found),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASK_FILE: &str = r#"
- name: test
  ansible.builtin.set_fact:
    _docker_dev_dri: "{{ lookup('docker_var', '_docker_dev_dri', default=false) }}"
    _docker_network_mode: "{{ lookup('docker_var', '_docker_network_mode', default='bridge') }}"
    _docker_var_specs:
      _docker_extra_hosts:
        type: list
      _docker_memory:
        type: string
"#;

    fn resources_with(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let tasks = dir.path().join("tasks").join("docker");
        fs::create_dir_all(&tasks).unwrap();
        fs::write(tasks.join("create.yml"), content).unwrap();
        fs::write(tasks.join("notes.txt"), "lookup('docker_var', '_docker_txt')").unwrap();
        dir
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_suffix("_docker_dev_dri"), "dev_dri");
        assert_eq!(normalize_suffix("dev_dri"), "dev_dri");
        assert_eq!(normalize_suffix("_dev_dri"), "dev_dri");
        assert_eq!(normalize_suffix("  _docker_memory  "), "memory");
        assert_eq!(normalize_suffix(""), "");
    }

    #[test]
    fn scans_lookups_and_specs() {
        let dir = resources_with(TASK_FILE);
        let scanner = DockerVarScanner::new(dir.path());
        let found: Vec<_> = scanner.suffixes().unwrap().iter().cloned().collect();
        assert_eq!(found, vec!["dev_dri", "extra_hosts", "memory", "network_mode"]);
    }

    #[test]
    fn additional_excludes_defined_and_ignored() {
        let dir = resources_with(TASK_FILE);
        let scanner = DockerVarScanner::new(dir.path());
        let role_vars = ["myrole_role_docker_network_mode"];
        let ignore = vec!["_docker_dev_dri".to_string(), "extra_hosts".to_string()];
        let extra = scanner
            .additional_suffixes("myrole", &role_vars, &ignore)
            .unwrap();
        assert_eq!(extra, vec!["memory"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = DockerVarScanner::new(dir.path());
        assert!(scanner.suffixes().unwrap().is_empty());
    }

    #[test]
    fn templated_yaml_still_yields_lookups() {
        let dir = resources_with("key: {{ lookup('docker_var', '_docker_shm_size') }}\n  bad: [\n");
        let scanner = DockerVarScanner::new(dir.path());
        assert!(scanner.suffixes().unwrap().contains("shm_size"));
    }

    #[test]
    fn categories_and_types() {
        assert_eq!(category("memory_swappiness"), "Resource Limits");
        assert_eq!(category("cap_drop"), "Security & Devices");
        assert_eq!(category("dns_servers"), "Networking");
        assert_eq!(category("tmpfs"), "Storage");
        assert_eq!(category("restart_policy"), "Monitoring & Lifecycle");
        assert_eq!(category("image"), "Other Options");

        assert_eq!(option_type("privileged"), VarType::Bool);
        assert_eq!(option_type("cpu_shares"), VarType::Int);
        assert_eq!(option_type("volumes"), VarType::List);
        assert_eq!(option_type("labels"), VarType::Dict);
        assert_eq!(option_type("image"), VarType::String);
    }

    #[test]
    fn categorize_groups() {
        let groups = categorize(&["cpus", "ports", "image"]);
        assert_eq!(groups["Resource Limits"], vec!["cpus"]);
        assert_eq!(groups["Networking"], vec!["ports"]);
        assert_eq!(groups["Other Options"], vec!["image"]);
    }
}
