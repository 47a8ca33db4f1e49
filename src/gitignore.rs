//! `.gitignore` matching for the tree root.
//!
//! The matcher is chosen once, when it is built:
//!
//! - `Glob`: the root `.gitignore` compiled with the `ignore` crate, with
//!   full gitignore semantics (negation, anchoring, directory-only rules).
//! - `Literal`: every pattern is a plain substring/prefix of the
//!   root-relative path. Only built on request, see
//!   [`IgnoreMatcher::literal_from_file`].
//! - `Permissive`: nothing matches. Used when the root `.gitignore` is
//!   missing, unreadable or does not compile.
//!
//! Construction never fails.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Name of the ignore file looked up at the root.
pub const IGNORE_FILE: &str = ".gitignore";

#[derive(Debug, Clone)]
enum Strategy {
    Glob(Arc<Gitignore>),
    Literal(Arc<[String]>),
    Permissive,
}

/// Predicate over paths under one root.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    root: PathBuf,
    strategy: Strategy,
}

impl IgnoreMatcher {
    /// Matcher that never ignores anything.
    pub fn permissive(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strategy: Strategy::Permissive,
        }
    }

    /// Build the matcher for `root/.gitignore`.
    ///
    /// A single bad pattern makes the whole file unusable.
    pub fn for_root(root: &Path) -> Self {
        let path = root.join(IGNORE_FILE);
        if !path.is_file() {
            return Self::permissive(root);
        }

        let Some(patterns) = read_patterns(&path) else {
            return Self::permissive(root);
        };

        let mut builder = GitignoreBuilder::new(root);
        for line in &patterns {
            if let Err(err) = builder.add_line(None, line) {
                tracing::warn!(
                    file = %path.display(),
                    %err,
                    "malformed ignore pattern, nothing will be ignored"
                );
                return Self::permissive(root);
            }
        }

        match builder.build() {
            Ok(gitignore) => Self {
                root: root.to_path_buf(),
                strategy: Strategy::Glob(Arc::new(gitignore)),
            },
            Err(err) => {
                tracing::warn!(
                    file = %path.display(),
                    %err,
                    "ignore file did not compile, nothing will be ignored"
                );
                Self::permissive(root)
            }
        }
    }

    /// Literal substring/prefix matcher for the ignore file at `path`.
    ///
    /// The root is the directory holding the file. A missing or unreadable
    /// file yields a permissive matcher.
    pub fn literal_from_file(path: &Path) -> Self {
        let root = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        match read_patterns(path) {
            Some(patterns) => Self::literal(&root, patterns),
            None => Self::permissive(root),
        }
    }

    fn literal(root: &Path, patterns: Vec<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            strategy: Strategy::Literal(patterns.into()),
        }
    }

    /// Whether anything can match.
    pub fn is_permissive(&self) -> bool {
        matches!(self.strategy, Strategy::Permissive)
    }

    /// Whether the literal strategy is in use.
    pub fn is_literal(&self) -> bool {
        matches!(self.strategy, Strategy::Literal(_))
    }

    /// Check a path, absolute under the root or already root-relative.
    ///
    /// Paths outside the root and the root itself are never ignored.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if self.is_permissive() {
            return false;
        }

        let rel = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => return false,
            }
        } else {
            path
        };
        if rel.as_os_str().is_empty() {
            return false;
        }

        match &self.strategy {
            Strategy::Glob(gitignore) => gitignore
                .matched_path_or_any_parents(rel, is_dir)
                .is_ignore(),
            Strategy::Literal(patterns) => {
                let text = slash_path(rel);
                patterns
                    .iter()
                    .any(|p| text.contains(p.as_str()) || text.starts_with(&format!("{p}/")))
            }
            Strategy::Permissive => false,
        }
    }
}

/// Non-blank, non-comment lines of an ignore file.
fn read_patterns(path: &Path) -> Option<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
        ),
        Err(err) => {
            tracing::warn!(
                file = %path.display(),
                %err,
                "cannot read ignore file, nothing will be ignored"
            );
            None
        }
    }
}

/// Root-relative path joined with `/` on every platform.
pub(crate) fn slash_path(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(seg) => Some(seg.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_permissive() {
        let dir = TempDir::new().unwrap();
        let matcher = IgnoreMatcher::for_root(dir.path());
        assert!(matcher.is_permissive());
        assert!(!matcher.is_ignored(&dir.path().join("anything.py"), false));
    }

    #[test]
    fn test_glob_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "# comment\n*.log\nsecret/\n\n/top.py\n").unwrap();

        let matcher = IgnoreMatcher::for_root(dir.path());
        assert!(!matcher.is_permissive());
        assert!(!matcher.is_literal());

        assert!(matcher.is_ignored(Path::new("debug.log"), false));
        assert!(matcher.is_ignored(Path::new("nested/debug.log"), false));
        assert!(matcher.is_ignored(Path::new("secret"), true));
        assert!(matcher.is_ignored(Path::new("secret/keys.json"), false));
        assert!(matcher.is_ignored(&dir.path().join("top.py"), false));
        assert!(!matcher.is_ignored(Path::new("sub/top.py"), false));
        assert!(!matcher.is_ignored(Path::new("app.py"), false));
    }

    #[test]
    fn test_malformed_file_is_permissive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "{\ngen\n").unwrap();

        let matcher = IgnoreMatcher::for_root(dir.path());
        assert!(matcher.is_permissive());
        assert!(!matcher.is_literal());
        assert!(!matcher.is_ignored(Path::new("gen"), true));
        assert!(!matcher.is_ignored(Path::new("backend/generator.py"), false));
    }

    #[test]
    fn test_negation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.json\n!package.json\n").unwrap();

        let matcher = IgnoreMatcher::for_root(dir.path());
        assert!(matcher.is_ignored(Path::new("data.json"), false));
        assert!(!matcher.is_ignored(Path::new("package.json"), false));
    }

    #[test]
    fn test_literal_substring_and_prefix() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(".gitignore");
        fs::write(&file, "# generated\ngenerated\nbackend/tmp\n").unwrap();

        let matcher = IgnoreMatcher::literal_from_file(&file);
        assert!(matcher.is_literal());
        assert!(matcher.is_ignored(Path::new("generated"), true));
        assert!(matcher.is_ignored(Path::new("src/generated_types.ts"), false));
        assert!(matcher.is_ignored(Path::new("backend/tmp/x.py"), false));
        assert!(matcher.is_ignored(&dir.path().join("backend/tmp"), true));
        assert!(!matcher.is_ignored(Path::new("backend/app.py"), false));
    }

    #[test]
    fn test_literal_missing_file() {
        let dir = TempDir::new().unwrap();
        let matcher = IgnoreMatcher::literal_from_file(&dir.path().join(".gitignore"));
        assert!(matcher.is_permissive());
    }

    #[test]
    fn test_outside_root_never_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.py\n").unwrap();

        let matcher = IgnoreMatcher::for_root(dir.path());
        assert!(!matcher.is_ignored(Path::new("/somewhere/else/app.py"), false));
        assert!(!matcher.is_ignored(dir.path(), true));
    }

    #[test]
    fn test_slash_path() {
        let rel: PathBuf = ["a", "b", "c.py"].iter().collect();
        assert_eq!(slash_path(&rel), "a/b/c.py");
        assert_eq!(slash_path(Path::new("")), "");
    }
}
