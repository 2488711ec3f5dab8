//! roledoc: document the variables of Ansible role defaults files.
//!
//! Supports two modes:
//!
//! - **stdin mode**: `roledoc --role plex < roles/plex/defaults/main.yml`
//! - **file mode**: `roledoc -o docs/roles roles/*/defaults/main.yml`

use anyhow::{Context, Result};
use clap::Parser;
use roledoc::config::Config;
use roledoc::docker::DockerVarScanner;
use roledoc::lookup::LookupScanner;
use roledoc::model::{RepoType, RoleInfo};
use roledoc::render::Renderer;
use roledoc::report::{self, ReportOptions};
use roledoc::{parser, render, Error};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "roledoc",
    about = "Generate variable documentation from annotated Ansible role defaults"
)]
struct Cli {
    /// Input files, role directories or glob patterns. If omitted, reads from stdin.
    files: Vec<String>,

    /// Output directory (required when files are given)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Type inference and ignore-list configuration (YAML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Role name. Defaults to "role" for stdin; derived from the path otherwise.
    #[arg(short = 'r', long)]
    role: Option<String>,

    #[arg(long, value_enum, default_value_t = RepoType::Saltbox)]
    repo_type: RepoType,

    /// Example instance name for multi-instance roles (default: <role>2)
    #[arg(long)]
    instance: Option<String>,

    /// Shared inventory file scanned for role_var lookups
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Resources directory holding tasks/docker/*.yml
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Output format: markdown (default), json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Inputs shared by every role rendered in one run.
struct RunContext {
    config: Config,
    inventory: Option<LookupScanner>,
    docker: Option<DockerVarScanner>,
    renderer: Box<dyn Renderer>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = build_context(&cli)?;

    if cli.files.is_empty() {
        return stdin_mode(&cli, &ctx);
    }

    file_mode(&cli, &ctx)
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

fn build_context(cli: &Cli) -> Result<RunContext> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let inventory = cli
        .inventory
        .as_ref()
        .map(|path| LookupScanner::new(path, config.global_overrides.ignore_suffixes.clone()));
    let docker = cli.resources.as_ref().map(DockerVarScanner::new);
    let renderer = render::create_renderer(&cli.format)?;

    Ok(RunContext {
        config,
        inventory,
        docker,
        renderer,
    })
}

/// stdin mode: parse stdin, write the rendered report to stdout.
fn stdin_mode(cli: &Cli, ctx: &RunContext) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let role_name = cli.role.as_deref().unwrap_or("role");
    let role = parser::parse(&input, role_name, cli.repo_type);
    print!("{}", render_role(cli, ctx, &role)?.1);
    Ok(())
}

/// file mode: render every input role into the output directory.
fn file_mode(cli: &Cli, ctx: &RunContext) -> Result<()> {
    let output_dir = cli
        .output
        .as_deref()
        .context("--output is required when files are given")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let input_files = expand_inputs(&cli.files)?;
    let ext = ctx.renderer.file_extension();

    for path in &input_files {
        let role_name = match (&cli.role, input_files.len()) {
            (Some(role), 1) => role.clone(),
            _ => parser::role_name_from_path(path),
        };
        let role = match parser::parse_file(path, &role_name, cli.repo_type) {
            Ok(role) => role,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping");
                continue;
            }
        };

        let (count, output) = render_role(cli, ctx, &role)?;
        if count == 0 {
            info!(role = %role_name, "no documentable variables, skipping");
            continue;
        }

        let out_path = output_dir.join(format!("{}.{}", role_name, ext));
        fs::write(&out_path, &output)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        info!(role = %role_name, variables = count, path = %out_path.display(), "wrote");
    }

    Ok(())
}

/// Build and render one role. Returns the documented variable count too.
fn render_role(cli: &Cli, ctx: &RunContext, role: &RoleInfo) -> Result<(usize, String)> {
    let inventory_lookups = match &ctx.inventory {
        Some(scanner) => Some(scanner.lookups().context("failed to scan inventory")?),
        None => None,
    };
    let options = ReportOptions {
        instance: cli.instance.clone(),
        inventory_lookups,
        docker: ctx.docker.as_ref(),
    };
    let report = report::build(role, &ctx.config, &options)
        .with_context(|| format!("failed to build report for {}", role.name))?;
    let output = ctx.renderer.render(&report)?;
    Ok((report.variable_count(), output))
}

/// Resolve inputs into defaults files.
///
/// A file is taken as is. A directory contributes `defaults/main.yml` when
/// present, else every `.yml`/`.yaml` file directly inside. Anything else is
/// treated as a glob pattern.
fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            files.extend(files_in_dir(path)?);
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .map_err(|source| Error::Glob {
                pattern: pattern.clone(),
                source,
            })?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!(pattern = %pattern, "no files matched");
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    debug!(count = files.len(), "resolved input files");
    Ok(files)
}

fn files_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let defaults = dir.join("defaults").join("main.yml");
    if defaults.is_file() {
        return Ok(vec![defaults]);
    }
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_yaml(p))
        .collect())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_extensions() {
        assert!(is_yaml(Path::new("defaults/main.yml")));
        assert!(is_yaml(Path::new("vars.yaml")));
        assert!(!is_yaml(Path::new("README.md")));
        assert!(!is_yaml(Path::new("Makefile")));
    }

    #[test]
    fn role_dir_prefers_defaults_main() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = dir.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join("main.yml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("other.yml"), "b: 1\n").unwrap();

        let files = files_in_dir(dir.path()).unwrap();
        assert_eq!(files, vec![defaults.join("main.yml")]);
    }

    #[test]
    fn plain_dir_lists_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "b: 1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "c").unwrap();

        let mut files = files_in_dir(dir.path()).unwrap();
        files.sort();
        assert_eq!(files, vec![dir.path().join("a.yml"), dir.path().join("b.yaml")]);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let err = expand_inputs(&["[".to_string()]).unwrap_err();
        assert!(err.to_string().contains("invalid glob pattern"));
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "roledoc",
            "-o",
            "out",
            "--repo-type",
            "sandbox",
            "-vv",
            "-f",
            "json",
            "roles/plex",
        ])
        .unwrap();
        assert_eq!(cli.repo_type, RepoType::Sandbox);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, "json");
        assert_eq!(cli.files, vec!["roles/plex"]);
    }
}
