//! Parser module: role defaults files.

pub mod defaults;
pub mod value;

pub use defaults::parse;

use crate::error::{Error, Result};
use crate::model::{RepoType, RoleInfo};
use std::fs;
use std::path::Path;

/// Read and parse a defaults file from disk.
pub fn parse_file(path: &Path, role_name: &str, repo_type: RepoType) -> Result<RoleInfo> {
    let content = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(defaults::parse(&content, role_name, repo_type))
}

/// Role name for a defaults file path.
///
/// `roles/plex/defaults/main.yml` → `plex`; any other path → its file stem.
pub fn role_name_from_path(path: &Path) -> String {
    let components: Vec<&str> = path
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if let [.., role, "defaults", _file] = components.as_slice() {
        return (*role).to_string();
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("role")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn role_name_from_defaults_path() {
        assert_eq!(
            role_name_from_path(Path::new("/srv/git/saltbox/roles/plex/defaults/main.yml")),
            "plex"
        );
        assert_eq!(role_name_from_path(Path::new("sonarr/defaults/main.yml")), "sonarr");
    }

    #[test]
    fn role_name_falls_back_to_stem() {
        assert_eq!(role_name_from_path(Path::new("fixtures/authelia.yml")), "authelia");
    }

    #[test]
    fn parse_file_reads_content() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"foo: 1\n").unwrap();
        let role = parse_file(file.path(), "demo", RepoType::Sandbox).unwrap();
        assert_eq!(role.name, "demo");
        assert_eq!(role.repo_type, RepoType::Sandbox);
        assert_eq!(role.all_variables.len(), 1);
    }

    #[test]
    fn parse_file_missing_is_read_error() {
        let err = parse_file(Path::new("/nonexistent/defaults/main.yml"), "x", RepoType::Saltbox)
            .unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
