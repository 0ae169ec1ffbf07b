//! Precedence resolution for the tool's own settings and for property values.
//!
//! ## Project directory (highest to lowest)
//!
//! 1. `--project` / `-C` CLI flag
//! 2. `GPROPS_PROJECT` environment variable
//! 3. Current directory
//!
//! ## Data directory for private profiles (highest to lowest)
//!
//! 1. `GPROPS_DATA_DIR` environment variable
//! 2. Platform data directory (`~/.local/share` on Linux)
//!
//! ## Property values
//!
//! A property value comes from the selected profile, from the default
//! profile, from both (merged), or from the property's built-in default.

use std::path::{Path, PathBuf};

use crate::Result;
use crate::settings::ProfileKey;
use crate::storage::FilePersister;

/// Environment variable naming the project directory.
pub const PROJECT_ENV: &str = "GPROPS_PROJECT";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "GPROPS_DATA_DIR";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from a CLI flag
    CliFlag,
    /// Value from an environment variable
    EnvVar(String),
    /// Value stored in the named profile
    Profile(ProfileKey),
    /// Value stored in the default profile
    DefaultProfile,
    /// Both the profile and the default profile contributed
    Merged,
    /// Built-in default value
    Builtin,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::Profile(key) => write!(f, "profile:{}", key),
            ValueSource::DefaultProfile => write!(f, "default-profile"),
            ValueSource::Merged => write!(f, "merged"),
            ValueSource::Builtin => write!(f, "builtin"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Resolve the project directory.
pub fn resolve_project_dir(flag: Option<&Path>) -> Result<Resolved<PathBuf>> {
    if let Some(dir) = flag {
        return Ok(Resolved::new(dir.to_path_buf(), ValueSource::CliFlag));
    }
    if let Some(dir) = non_empty_env(PROJECT_ENV) {
        return Ok(Resolved::new(
            PathBuf::from(dir),
            ValueSource::EnvVar(PROJECT_ENV.to_string()),
        ));
    }
    Ok(Resolved::new(std::env::current_dir()?, ValueSource::Builtin))
}

/// Resolve the data directory, if there is one.
pub fn resolve_data_dir() -> Option<Resolved<PathBuf>> {
    if let Some(dir) = non_empty_env(DATA_DIR_ENV) {
        return Some(Resolved::new(
            PathBuf::from(dir),
            ValueSource::EnvVar(DATA_DIR_ENV.to_string()),
        ));
    }
    dirs::data_dir().map(|dir| Resolved::new(dir, ValueSource::Builtin))
}

/// File persister for `project_dir` using the resolved data directory.
pub fn open_persister(project_dir: &Path) -> Result<FilePersister> {
    match resolve_data_dir() {
        Some(data_dir) => FilePersister::with_data_dir(project_dir, &data_dir.value),
        None => FilePersister::new(project_dir),
    }
}

/// Where a merged property value came from.
///
/// `selected` is the profile the value was resolved for; `in_profile` and
/// `in_default` tell whether each level stores a value, and `merged_differs`
/// whether merging changed the profile's own value.
pub fn value_source(
    selected: &ProfileKey,
    in_profile: bool,
    in_default: bool,
    merged_differs: bool,
) -> ValueSource {
    match (selected.is_default(), in_profile, in_default) {
        (true, true, _) => ValueSource::DefaultProfile,
        (false, true, true) if merged_differs => ValueSource::Merged,
        (false, true, _) => ValueSource::Profile(selected.clone()),
        (_, false, true) => ValueSource::DefaultProfile,
        (_, false, false) => ValueSource::Builtin,
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // ==================== ValueSource Tests ====================

    #[test]
    fn test_value_source_display() {
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(
            format!("{}", ValueSource::EnvVar("FOO".to_string())),
            "env:FOO"
        );
        assert_eq!(
            format!("{}", ValueSource::Profile(ProfileKey::named("debug").unwrap())),
            "profile:debug"
        );
        assert_eq!(format!("{}", ValueSource::DefaultProfile), "default-profile");
        assert_eq!(format!("{}", ValueSource::Merged), "merged");
        assert_eq!(format!("{}", ValueSource::Builtin), "builtin");
    }

    #[test]
    fn test_value_source_for_property() {
        let debug = ProfileKey::named("debug").unwrap();
        assert_eq!(value_source(&debug, true, false, false), ValueSource::Profile(debug.clone()));
        assert_eq!(value_source(&debug, true, true, false), ValueSource::Profile(debug.clone()));
        assert_eq!(value_source(&debug, true, true, true), ValueSource::Merged);
        assert_eq!(value_source(&debug, false, true, false), ValueSource::DefaultProfile);
        assert_eq!(value_source(&debug, false, false, false), ValueSource::Builtin);
        assert_eq!(
            value_source(&ProfileKey::Default, true, true, false),
            ValueSource::DefaultProfile
        );
    }

    // ==================== Directory Resolution Tests ====================

    #[test]
    #[serial]
    fn test_project_dir_precedence() {
        unsafe { std::env::set_var(PROJECT_ENV, "/from/env") };
        let flag = resolve_project_dir(Some(Path::new("/from/flag"))).unwrap();
        assert_eq!(flag.value, PathBuf::from("/from/flag"));
        assert_eq!(flag.source, ValueSource::CliFlag);

        let env = resolve_project_dir(None).unwrap();
        assert_eq!(env.value, PathBuf::from("/from/env"));
        assert_eq!(env.source, ValueSource::EnvVar(PROJECT_ENV.to_string()));

        unsafe { std::env::remove_var(PROJECT_ENV) };
        let cwd = resolve_project_dir(None).unwrap();
        assert_eq!(cwd.value, std::env::current_dir().unwrap());
        assert_eq!(cwd.source, ValueSource::Builtin);
    }

    #[test]
    #[serial]
    fn test_data_dir_from_env() {
        unsafe { std::env::set_var(DATA_DIR_ENV, "/tmp/gprops-data") };
        let resolved = resolve_data_dir().unwrap();
        assert_eq!(resolved.value, PathBuf::from("/tmp/gprops-data"));
        assert_eq!(resolved.source, ValueSource::EnvVar(DATA_DIR_ENV.to_string()));
        unsafe { std::env::remove_var(DATA_DIR_ENV) };
    }
}
