//! Top-down directory traversal.
//!
//! Uses the `ignore` crate's walker with its automatic filters turned off:
//! exclusion is decided by [`ProjectConfig::is_excluded_dir`] and the
//! root's [`IgnoreMatcher`], nothing else. Children are visited in file
//! name order so repeated runs over the same tree see the same sequence.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use thiserror::Error;

use crate::config::ProjectConfig;
use crate::gitignore::IgnoreMatcher;

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    /// Classify a failure to open the root directory.
    pub fn from_root_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => WalkError::NotFound { path },
            io::ErrorKind::PermissionDenied => WalkError::PermissionDenied { path },
            _ => WalkError::Io { path, source },
        }
    }
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Supplies the directory denylist, applied wherever a name appears,
    /// root included.
    pub config: Arc<ProjectConfig>,
    /// Ignore rules applied to every entry below the root.
    pub matcher: IgnoreMatcher,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
}

impl WalkOptions {
    /// Walk with `config`'s denylist and `matcher`, not following links.
    pub fn new(config: Arc<ProjectConfig>, matcher: IgnoreMatcher) -> Self {
        Self {
            config,
            matcher,
            follow_symlinks: false,
        }
    }

    /// Options with no exclusions at all.
    pub fn unfiltered(root: &Path) -> Self {
        let config = ProjectConfig {
            exclude_dirs: BTreeSet::new(),
            ..ProjectConfig::new(root)
        };
        Self::new(Arc::new(config), IgnoreMatcher::permissive(root))
    }
}

/// One directory visited by the walk, with its surviving files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirVisit {
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Number of path segments between the root and this directory.
    pub depth: usize,
    /// Files directly inside the directory, sorted by name.
    pub files: Vec<PathBuf>,
}

/// Walk `root` top-down and group surviving files by directory.
///
/// Directories come back in pre-order (a directory before everything
/// beneath it). A root that cannot be listed is an error. Entry-level
/// errors such as unreadable subdirectories are logged and skipped.
pub fn walk_directories(root: &Path, options: &WalkOptions) -> Result<Vec<DirVisit>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }

    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "root is not a directory, nothing to walk");
        return Ok(Vec::new());
    }

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if options.config.is_excluded_dir(&root_name) {
        tracing::debug!(root = %root.display(), "root directory is excluded");
        return Ok(Vec::new());
    }

    if let Err(err) = std::fs::read_dir(root) {
        return Err(WalkError::from_root_io(root, err));
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name(|a, b| a.cmp(b));

    let config = Arc::clone(&options.config);
    let matcher = options.matcher.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if is_dir && config.is_excluded_dir(&entry.file_name().to_string_lossy()) {
            return false;
        }
        !matcher.is_ignored(entry.path(), is_dir)
    });

    let mut visits: Vec<DirVisit> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());

        if is_dir {
            index.insert(path.to_path_buf(), visits.len());
            visits.push(DirVisit {
                path: path.to_path_buf(),
                depth: relative_depth(root, path),
                files: Vec::new(),
            });
        } else if entry.depth() > 0 && path.is_file() {
            let slot = path.parent().and_then(|parent| index.get(parent)).copied();
            if let Some(slot) = slot {
                visits[slot].files.push(path.to_path_buf());
            }
        }
    }

    Ok(visits)
}

/// Segment count of `path` relative to `root`.
fn relative_depth(root: &Path, path: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count())
        .unwrap_or(0)
}
