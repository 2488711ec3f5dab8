use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_roledoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn plex_defaults() -> String {
    fixture_path("roles/plex/defaults/main.yml")
}

fn json_output(args: &[&str]) -> serde_json::Value {
    let assert = cmd()
        .args(["-f", "json"])
        .args(args)
        .write_stdin(std::fs::read_to_string(plex_defaults()).unwrap())
        .assert()
        .success();
    serde_json::from_slice(&assert.get_output().stdout).unwrap()
}

fn variable<'a>(report: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    report["sections"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|s| {
            let own = s["variables"].as_array().unwrap().iter();
            let nested = s["subsections"]
                .as_array()
                .unwrap()
                .iter()
                .flat_map(|sub| sub["variables"].as_array().unwrap().iter());
            own.chain(nested)
        })
        .find(|v| v["name"] == name)
        .unwrap_or_else(|| panic!("variable {} not in report", name))
}

// -- stdin mode --

#[test]
fn stdin_mode_produces_markdown() {
    let input = std::fs::read_to_string(plex_defaults()).unwrap();
    cmd()
        .args(["--role", "plex"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# plex\n"))
        .stdout(predicate::str::contains("## Web\n"))
        .stdout(predicate::str::contains(
            "# Port Plex listens on inside the container\n# Type: string\nplex_role_web_port: \"32400\"",
        ))
        .stdout(predicate::str::contains("Instance-level (`plex2`):"))
        .stdout(predicate::str::contains("plex2_web_port: \"32400\""));
}

#[test]
fn stdin_mode_defaults_role_name() {
    cmd()
        .write_stdin("foo_enabled: true\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# role\n"))
        .stdout(predicate::str::contains("## General"));
}

#[test]
fn sections_follow_source_order_without_banner() {
    let report = json_output(&["-r", "plex"]);
    let names: Vec<_> = report["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Basics", "Paths", "Web", "Docker"]);
}

#[test]
fn types_and_comments() {
    let report = json_output(&["-r", "plex"]);
    assert_eq!(variable(&report, "plex_instances")["type"], "list");
    assert_eq!(variable(&report, "plex_role_web_scheme")["type"], "string (http/https)");
    assert_eq!(variable(&report, "plex_role_docker_envs_default")["type"], "dict");
    assert_eq!(variable(&report, "plex_role_docker_privileged")["type"], "bool");
    assert_eq!(variable(&report, "plex_role_web_port")["type"], "string");
    assert_eq!(
        variable(&report, "plex_role_docker_devices")["comment"],
        "Extra settings shared by every instance\nOnly relevant with GPUs"
    );
}

#[test]
fn skipped_and_hidden_variables_are_absent() {
    let output = cmd()
        .args(["-f", "json", "-r", "plex"])
        .write_stdin(std::fs::read_to_string(plex_defaults()).unwrap())
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(!stdout.contains("plex_role_paths_folders_list"));
    assert!(!stdout.contains("plex_role_docker_internal_marker"));
    assert!(!stdout.contains("\"name\": \"plex_role_docker_envs\""));
}

#[test]
fn inventory_and_config() {
    let report = json_output(&[
        "-r",
        "plex",
        "--inventory",
        &fixture_path("inventory.yml"),
        "-c",
        &fixture_path("config.yml"),
    ]);
    let lookups = &report["role_var_lookups"];
    assert_eq!(lookups["_web_scheme"], "string (http/https)");
    assert_eq!(lookups["_dns_proxy"], "bool");
    assert_eq!(lookups["_traefik_certresolver"], "string");
    assert!(lookups.get("_internal_thing").is_none());
}

#[test]
fn docker_options_from_resources() {
    let report = json_output(&[
        "-r",
        "plex",
        "--resources",
        &fixture_path("resources"),
        "-c",
        &fixture_path("config.yml"),
    ]);
    let categories: Vec<_> = report["docker_options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        categories,
        vec!["Resource Limits", "Networking", "Monitoring & Lifecycle"]
    );
    let limits = &report["docker_options"][0]["options"];
    assert_eq!(limits.as_array().unwrap().len(), 1);
    assert_eq!(limits[0]["suffix"], "memory");
}

#[test]
fn custom_instance_and_repo_type() {
    let report = json_output(&["-r", "plex", "--instance", "plex4k", "--repo-type", "sandbox"]);
    assert_eq!(report["repo_type"], "sandbox");
    assert_eq!(report["instance"], "plex4k");
    assert_eq!(
        variable(&report, "plex_role_web_subdomain")["instance_name"],
        "plex4k_web_subdomain"
    );
}

// -- file mode --

#[test]
fn file_mode_derives_role_name() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(plex_defaults())
        .assert()
        .success();

    let output = std::fs::read_to_string(dir.path().join("plex.md")).unwrap();
    assert!(output.starts_with("# plex\n"));
}

#[test]
fn file_mode_role_directories_and_empty_roles() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap(), "-f", "json"])
        .arg(fixture_path("roles/plex"))
        .arg(fixture_path("roles/empty"))
        .assert()
        .success();

    assert!(dir.path().join("plex.json").exists());
    assert!(!dir.path().join("empty.json").exists());
}

#[test]
fn file_mode_glob_pattern() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("roles/*/defaults/main.yml"))
        .assert()
        .success();

    assert!(dir.path().join("plex.md").exists());
}

#[test]
fn file_mode_requires_output() {
    cmd()
        .arg(plex_defaults())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output is required"));
}

#[test]
fn unknown_format_fails() {
    cmd()
        .args(["-f", "html"])
        .write_stdin("a: 1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format: html"));
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.yml");
    std::fs::write(&config, "type_inference: [not, a, mapping]\n").unwrap();

    cmd()
        .args(["-c", config.to_str().unwrap()])
        .write_stdin("a: 1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}
