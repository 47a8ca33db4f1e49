//! Fluent builder API and the digest pipeline.
//!
//! The pipeline walks the tree once, top-down. For every surviving
//! directory it classifies the directory's role, summarizes each
//! recognized file and folds the results into an [`Aggregate`], which is
//! threaded through the walk by value. The finished aggregate renders the
//! report and the per-role listings.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::instrument;

use crate::config::{ProjectConfig, Role};
use crate::errors::DigestError;
use crate::filter::{extension_key, is_config_note, passes_extension_filter};
use crate::gitignore::{slash_path, IgnoreMatcher, IGNORE_FILE};
use crate::report::{listing_entry, listing_error, Aggregate, DirectorySink, ListingSink, Report};
use crate::summarize::{count_lines, summarize_path, Outline};
use crate::walker::{walk_directories, DirVisit, WalkOptions};

/// Builder for a digest of one source tree.
///
/// # Examples
///
/// ```no_run
/// use codebrief::builder::Digest;
///
/// let report = Digest::new("./my-app")
///     .max_depth(3)
///     .exclude_dirs(["migrations"])
///     .build()
///     .unwrap();
///
/// println!("{}", report.text);
/// ```
#[derive(Debug, Clone)]
pub struct Digest {
    root: PathBuf,
    max_depth: Option<usize>,
    exclude_dirs: BTreeSet<String>,
    exclude_files: BTreeSet<String>,
    frontend_dirs: BTreeSet<String>,
    backend_dirs: BTreeSet<String>,
    literal_ignore: bool,
}

impl Digest {
    /// Create a new builder for the given root path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: None,
            exclude_dirs: BTreeSet::new(),
            exclude_files: BTreeSet::new(),
            frontend_dirs: BTreeSet::new(),
            backend_dirs: BTreeSet::new(),
            literal_ignore: false,
        }
    }

    /// Only report directories at most `depth` segments below the root.
    ///
    /// Deeper directories are still walked; their files are skipped.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Directory names to exclude on top of the base denylist.
    pub fn exclude_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// File names to exclude.
    pub fn exclude_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Replace the frontend marker directories.
    pub fn frontend_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frontend_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the backend marker directories.
    pub fn backend_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backend_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Match `.gitignore` patterns as plain substrings instead of globs.
    pub fn literal_ignore(mut self, literal: bool) -> Self {
        self.literal_ignore = literal;
        self
    }

    fn config(&self) -> ProjectConfig {
        ProjectConfig::new(&self.root)
            .with_excluded_dirs(self.exclude_dirs.iter().cloned())
            .with_excluded_files(self.exclude_files.iter().cloned())
            .with_frontend_dirs(self.frontend_dirs.clone())
            .with_backend_dirs(self.backend_dirs.clone())
    }

    /// Walk the tree and build the report without writing anything.
    pub fn build(&self) -> Result<Report, DigestError> {
        let config = self.config();
        if !config.root.exists() {
            return Err(DigestError::PathNotFound(self.root.clone()));
        }

        let matcher = if self.literal_ignore {
            IgnoreMatcher::literal_from_file(&config.root.join(IGNORE_FILE))
        } else {
            IgnoreMatcher::for_root(&config.root)
        };

        let aggregate = collect(&config, self.max_depth, matcher)?;
        Ok(Report::from_aggregate(&config.root, &config.root_name(), &aggregate))
    }

    /// Build the report and hand its listings to `sink`.
    pub fn run_with_sink(&self, sink: &mut dyn ListingSink) -> Result<Report, DigestError> {
        let report = self.build()?;
        report.write_listings(sink);
        Ok(report)
    }

    /// Build the report and write `<role>_code.txt` listings into the root.
    pub fn run(&self) -> Result<Report, DigestError> {
        let mut report = self.build()?;
        let mut sink = DirectorySink::new(&report.root);
        report.write_listings(&mut sink);
        report.artifacts = sink.written().to_vec();
        Ok(report)
    }
}

/// Walk the configured tree and fold every directory into an aggregate.
#[instrument(skip_all, fields(root = %config.root.display()))]
fn collect(
    config: &ProjectConfig,
    max_depth: Option<usize>,
    matcher: IgnoreMatcher,
) -> Result<Aggregate, DigestError> {
    let options = WalkOptions::new(Arc::new(config.clone()), matcher);

    let visits = walk_directories(&config.root, &options)?;
    tracing::debug!(directories = visits.len(), "walk finished");

    let aggregate = visits
        .iter()
        .fold(Aggregate::new(), |acc, visit| visit_directory(config, max_depth, visit, acc));

    tracing::info!(
        frontend_lines = aggregate.role(Role::Frontend).total_lines,
        backend_lines = aggregate.role(Role::Backend).total_lines,
        "digest complete"
    );
    Ok(aggregate)
}

/// Fold one directory's files into the aggregate.
fn visit_directory(
    config: &ProjectConfig,
    max_depth: Option<usize>,
    visit: &DirVisit,
    mut acc: Aggregate,
) -> Aggregate {
    if max_depth.is_some_and(|max| visit.depth > max) {
        tracing::trace!(dir = %visit.path.display(), depth = visit.depth, "beyond max depth");
        return acc;
    }

    let files: Vec<&PathBuf> = visit
        .files
        .iter()
        .filter(|path| passes_extension_filter(path) && !config.is_excluded_file(&file_name(path)))
        .collect();
    if files.is_empty() {
        return acc;
    }

    let rel_dir = visit.path.strip_prefix(&config.root).unwrap_or(Path::new(""));
    let rel_display = match slash_path(rel_dir) {
        rel if rel.is_empty() => ".".to_string(),
        rel => rel,
    };
    let role = Role::classify(config, rel_dir);
    tracing::debug!(dir = %rel_display, %role, files = files.len(), "summarizing directory");

    let mut outlines = Vec::new();
    for path in files {
        let name = file_name(path);
        let rel_file = format!("{rel_display}/{name}");
        acc.count_file(role, &extension_key(path));

        match read_text(path) {
            Ok(content) => {
                let lines = count_lines(&content);
                tracing::trace!(file = %rel_file, lines, "summarizing file");
                acc.add_lines(role, lines);

                let outline = summarize_path(path, &content);
                acc.push_listing(role, listing_entry(&rel_file, &content));

                if let Some(outline) = outline {
                    if is_config_note(path) {
                        acc.push_config_note(&rel_file, lines);
                    } else {
                        outlines.push(outline);
                    }
                }
            }
            Err(err) => {
                tracing::warn!(file = %rel_file, %err, "cannot read file");
                acc.push_listing(role, listing_error(&rel_file, &err));
                outlines.push(Outline::read_error(name, &err));
            }
        }
    }

    acc.push_block(&rel_display, visit.depth, &outlines);
    acc
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a whole file as UTF-8 text with newlines normalized to `\n`.
fn read_text(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let text = String::from_utf8(bytes).map_err(|e| e.utf8_error().to_string())?;
    if text.contains('\r') {
        Ok(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Ok(text)
    }
}

// ============================================================================
// Functional API
// ============================================================================

/// Build the digest of `root` and write its listings into `root`.
///
/// Fails only if `root` does not exist; nothing is written in that case.
///
/// # Examples
///
/// ```no_run
/// use codebrief::builder::build_report;
///
/// let report = build_report(".", Some(2), ["scripts"], ["secrets.py"]).unwrap();
/// println!("{}", report.text);
/// ```
pub fn build_report(
    root: impl AsRef<Path>,
    max_depth: Option<usize>,
    extra_exclude_dirs: impl IntoIterator<Item = impl Into<String>>,
    extra_exclude_files: impl IntoIterator<Item = impl Into<String>>,
) -> Result<Report, DigestError> {
    let mut digest = Digest::new(root.as_ref())
        .exclude_dirs(extra_exclude_dirs)
        .exclude_files(extra_exclude_files);
    if let Some(depth) = max_depth {
        digest = digest.max_depth(depth);
    }
    digest.run()
}
