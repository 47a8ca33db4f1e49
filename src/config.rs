//! Per-run project configuration and role classification.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

/// Directories never descended into.
pub const BASE_EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "__pycache__",
    "venv",
    ".venv",
    "lib",
    "vendor",
    ".git",
    "archive",
];

/// Directory names marking frontend code.
pub const DEFAULT_FRONTEND_DIRS: &[&str] = &["frontend", "client", "src"];

/// Directory names marking backend code.
pub const DEFAULT_BACKEND_DIRS: &[&str] = &["backend", "server", "api"];

/// Aggregation bucket for a directory and its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Frontend,
    Backend,
}

impl Role {
    /// Rendering order of the per-role sections.
    pub const ALL: [Role; 2] = [Role::Frontend, Role::Backend];

    /// Lowercase name, used for listing artifact names.
    pub fn name(self) -> &'static str {
        match self {
            Role::Frontend => "frontend",
            Role::Backend => "backend",
        }
    }

    /// Capitalized name, used in report headings.
    pub fn title(self) -> &'static str {
        match self {
            Role::Frontend => "Frontend",
            Role::Backend => "Backend",
        }
    }

    /// Role of a root-relative directory path.
    ///
    /// Frontend if any segment is a frontend marker, backend otherwise.
    /// Paths matching neither marker set fall through to backend.
    pub fn classify(config: &ProjectConfig, rel: &Path) -> Role {
        if config.is_frontend(rel) {
            Role::Frontend
        } else {
            if !config.is_backend(rel) {
                tracing::debug!(path = %rel.display(), "no role marker, defaulting to backend");
            }
            Role::Backend
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable configuration for one digest run.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Canonical root of the tree.
    pub root: PathBuf,
    pub frontend_dirs: BTreeSet<String>,
    pub backend_dirs: BTreeSet<String>,
    /// Base denylist plus caller additions.
    pub exclude_dirs: BTreeSet<String>,
    pub exclude_files: BTreeSet<String>,
}

impl ProjectConfig {
    /// Configuration with the default marker sets and base denylist.
    ///
    /// The root is canonicalized when it exists; a missing root is kept
    /// as given so the caller can report it.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root,
            frontend_dirs: to_set(DEFAULT_FRONTEND_DIRS.iter().copied()),
            backend_dirs: to_set(DEFAULT_BACKEND_DIRS.iter().copied()),
            exclude_dirs: to_set(BASE_EXCLUDE_DIRS.iter().copied()),
            exclude_files: BTreeSet::new(),
        }
    }

    /// Add directory names to the denylist.
    pub fn with_excluded_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Add file names to the denylist.
    pub fn with_excluded_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Replace the frontend markers. An empty set keeps the defaults.
    pub fn with_frontend_dirs(mut self, dirs: BTreeSet<String>) -> Self {
        if !dirs.is_empty() {
            self.frontend_dirs = dirs;
        }
        self
    }

    /// Replace the backend markers. An empty set keeps the defaults.
    pub fn with_backend_dirs(mut self, dirs: BTreeSet<String>) -> Self {
        if !dirs.is_empty() {
            self.backend_dirs = dirs;
        }
        self
    }

    /// Display name of the root directory.
    pub fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// True if any segment of `rel` is a frontend marker.
    pub fn is_frontend(&self, rel: &Path) -> bool {
        has_marker(rel, &self.frontend_dirs)
    }

    /// True if any segment of `rel` is a backend marker.
    pub fn is_backend(&self, rel: &Path) -> bool {
        has_marker(rel, &self.backend_dirs)
    }

    /// Checks a directory's own name, not its ancestors.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.contains(name)
    }

    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.exclude_files.contains(name)
    }
}

fn to_set<'a>(names: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    names.map(str::to_string).collect()
}

fn has_marker(rel: &Path, markers: &BTreeSet<String>) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(seg) => seg.to_str().is_some_and(|s| markers.contains(s)),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_segments() {
        let config = ProjectConfig::new("/nonexistent/project");
        assert!(config.is_frontend(Path::new("frontend/src/components")));
        assert!(config.is_frontend(Path::new("web/client")));
        assert!(!config.is_frontend(Path::new("frontends/app")));
        assert!(config.is_backend(Path::new("backend/app")));
        assert!(!config.is_backend(Path::new("")));
    }

    #[test]
    fn test_classify_defaults_to_backend() {
        let config = ProjectConfig::new("/nonexistent/project");
        assert_eq!(Role::classify(&config, Path::new("frontend")), Role::Frontend);
        assert_eq!(Role::classify(&config, Path::new("server/api")), Role::Backend);
        assert_eq!(Role::classify(&config, Path::new("scripts")), Role::Backend);
        assert_eq!(Role::classify(&config, Path::new("")), Role::Backend);
    }

    #[test]
    fn test_frontend_wins_over_backend() {
        let config = ProjectConfig::new("/nonexistent/project");
        assert_eq!(Role::classify(&config, Path::new("api/src")), Role::Frontend);
    }

    #[test]
    fn test_exclusion_sets() {
        let config = ProjectConfig::new("/nonexistent/project")
            .with_excluded_dirs(["tmp"])
            .with_excluded_files(["secrets.py"]);
        assert!(config.is_excluded_dir("node_modules"));
        assert!(config.is_excluded_dir("tmp"));
        assert!(!config.is_excluded_dir("src"));
        assert!(config.is_excluded_file("secrets.py"));
        assert!(!config.is_excluded_file("app.py"));
    }

    #[test]
    fn test_marker_overrides() {
        let config = ProjectConfig::new("/nonexistent/project")
            .with_frontend_dirs(["web".to_string()].into_iter().collect())
            .with_backend_dirs(BTreeSet::new());
        assert!(config.is_frontend(Path::new("web")));
        assert!(!config.is_frontend(Path::new("frontend")));
        assert!(config.is_backend(Path::new("backend")));
    }

    #[test]
    fn test_root_name() {
        let config = ProjectConfig::new("/nonexistent/project");
        assert_eq!(config.root_name(), "project");
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::Frontend.name(), "frontend");
        assert_eq!(Role::Backend.title(), "Backend");
        assert_eq!(Role::Backend.to_string(), "backend");
    }
}
