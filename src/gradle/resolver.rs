//! Placeholder expansion in setting values.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// Expands symbolic references in a string.
pub trait StringResolver: Send + Sync {
    /// The expanded string, or `None` when something could not be resolved.
    fn resolve(&self, text: &str) -> Option<String>;
}

/// Identity of the project being configured.
pub trait ProjectContext: Send + Sync {
    fn project_dir(&self) -> &Path;

    /// Display name, the directory name by default.
    fn project_name(&self) -> String {
        self.project_dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A project identified by its directory.
#[derive(Debug, Clone)]
pub struct DirectoryProject {
    dir: PathBuf,
}

impl DirectoryProject {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ProjectContext for DirectoryProject {
    fn project_dir(&self) -> &Path {
        &self.dir
    }
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z]+)\.([A-Za-z0-9_.\-]+)\}").expect("Invalid regex")
});

/// Resolves `${env.NAME}`, `${sys.NAME}`, `${project.dir}` and `${project.name}`.
#[derive(Default, Clone)]
pub struct PlaceholderResolver {
    env: HashMap<String, String>,
    sys: HashMap<String, String>,
    project: Option<Arc<dyn ProjectContext>>,
}

impl PlaceholderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver seeing the environment of this process.
    pub fn from_process_env() -> Self {
        Self::new().with_env(std::env::vars().collect())
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_sys(mut self, sys: HashMap<String, String>) -> Self {
        self.sys = sys;
        self
    }

    pub fn with_project(mut self, project: Arc<dyn ProjectContext>) -> Self {
        self.project = Some(project);
        self
    }

    fn lookup(&self, scope: &str, name: &str) -> Option<String> {
        match scope {
            "env" => self.env.get(name).cloned(),
            "sys" => self.sys.get(name).cloned(),
            "project" => {
                let project = self.project.as_ref()?;
                match name {
                    "dir" => Some(project.project_dir().display().to_string()),
                    "name" => Some(project.project_name()),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl StringResolver for PlaceholderResolver {
    fn resolve(&self, text: &str) -> Option<String> {
        let mut missing = None;
        let resolved = PLACEHOLDER.replace_all(text, |caps: &Captures| {
            match self.lookup(&caps[1], &caps[2]) {
                Some(value) => value,
                None => {
                    missing.get_or_insert_with(|| caps[0].to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(placeholder) => {
                tracing::debug!(placeholder = %placeholder, "Unresolved placeholder");
                None
            }
            None => Some(resolved.into_owned()),
        }
    }
}

impl std::fmt::Debug for PlaceholderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderResolver")
            .field("env", &self.env.len())
            .field("sys", &self.sys.len())
            .field("project", &self.project.as_ref().map(|p| p.project_dir().to_path_buf()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PlaceholderResolver {
        PlaceholderResolver::new()
            .with_env(HashMap::from([("HOME".to_string(), "/home/dev".to_string())]))
            .with_sys(HashMap::from([("user.name".to_string(), "dev".to_string())]))
            .with_project(Arc::new(DirectoryProject::new("/work/demo-app")))
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(resolver().resolve("8.5").as_deref(), Some("8.5"));
    }

    #[test]
    fn test_all_scopes() {
        let r = resolver();
        assert_eq!(r.resolve("${env.HOME}/gradle").as_deref(), Some("/home/dev/gradle"));
        assert_eq!(r.resolve("${sys.user.name}").as_deref(), Some("dev"));
        assert_eq!(r.resolve("${project.dir}/g").as_deref(), Some("/work/demo-app/g"));
        assert_eq!(r.resolve("${project.name}").as_deref(), Some("demo-app"));
    }

    #[test]
    fn test_unknown_placeholder_fails() {
        let r = resolver();
        assert_eq!(r.resolve("${env.NOPE}"), None);
        assert_eq!(r.resolve("${weird.x}"), None);
        assert_eq!(r.resolve("${project.version}"), None);
        assert_eq!(PlaceholderResolver::new().resolve("${project.dir}"), None);
    }
}
