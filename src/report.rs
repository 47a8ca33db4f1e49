//! Digest rendering and listing artifacts.
//!
//! [`Aggregate`] is the running state of one walk. It only ever grows:
//! counters are incremented and lists appended to, in traversal order.
//! Once the walk is over it renders the report text and one verbatim
//! listing per role.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::Role;
use crate::summarize::Outline;

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fixed second line of every report.
pub const OVERVIEW: &str = "Overview: Full-stack app with FastAPI backend and React frontend";

/// Per-role counters and verbatim listing entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleStats {
    /// Extension → number of files.
    pub file_types: BTreeMap<String, usize>,
    pub total_lines: usize,
    pub listings: Vec<String>,
}

impl RoleStats {
    fn merge(&mut self, other: RoleStats) {
        for (ext, count) in other.file_types {
            *self.file_types.entry(ext).or_insert(0) += count;
        }
        self.total_lines += other.total_lines;
        self.listings.extend(other.listings);
    }
}

/// Running state of a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    frontend: RoleStats,
    backend: RoleStats,
    /// Directory headers and outline lines, in traversal order.
    blocks: Vec<String>,
    config_notes: Vec<String>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self, role: Role) -> &RoleStats {
        match role {
            Role::Frontend => &self.frontend,
            Role::Backend => &self.backend,
        }
    }

    fn role_mut(&mut self, role: Role) -> &mut RoleStats {
        match role {
            Role::Frontend => &mut self.frontend,
            Role::Backend => &mut self.backend,
        }
    }

    pub fn count_file(&mut self, role: Role, extension: &str) {
        *self
            .role_mut(role)
            .file_types
            .entry(extension.to_string())
            .or_insert(0) += 1;
    }

    pub fn add_lines(&mut self, role: Role, lines: usize) {
        self.role_mut(role).total_lines += lines;
    }

    pub fn push_listing(&mut self, role: Role, entry: String) {
        self.role_mut(role).listings.push(entry);
    }

    pub fn push_config_note(&mut self, rel_file: &str, lines: usize) {
        self.config_notes.push(format!("  - {rel_file} - Lines: {lines}"));
    }

    /// Append one directory block: an indented header, then each outline.
    pub fn push_block(&mut self, rel_dir: &str, depth: usize, outlines: &[Outline]) {
        if outlines.is_empty() {
            return;
        }
        let indent = "  ".repeat(depth);
        self.blocks
            .push(format!("{indent}- /{rel_dir} ({} files)", outlines.len()));
        for outline in outlines {
            self.blocks.push(outline.render());
        }
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn config_notes(&self) -> &[String] {
        &self.config_notes
    }

    /// Combine with the aggregate of a walk that came after this one.
    ///
    /// Counts and line totals add up; ordered lists keep `self` first.
    pub fn merge(mut self, other: Aggregate) -> Aggregate {
        self.frontend.merge(other.frontend);
        self.backend.merge(other.backend);
        self.blocks.extend(other.blocks);
        self.config_notes.extend(other.config_notes);
        self
    }

    /// Serializable counters.
    pub fn stats(&self) -> Stats {
        let totals = |stats: &RoleStats| RoleTotals {
            file_types: stats.file_types.clone(),
            total_lines: stats.total_lines,
        };
        Stats {
            frontend: totals(&self.frontend),
            backend: totals(&self.backend),
        }
    }

    /// Render the report text.
    pub fn render(&self, root_name: &str) -> String {
        let mut lines = Vec::with_capacity(self.blocks.len() + 16);
        lines.push(format!("Project Root: {root_name}"));
        lines.push(OVERVIEW.to_string());
        lines.extend(self.blocks.iter().cloned());

        if !self.config_notes.is_empty() {
            lines.push("\nConfiguration Files:".to_string());
            lines.extend(self.config_notes.iter().cloned());
        }

        for role in Role::ALL {
            let stats = self.role(role);
            lines.push(format!("\n{} File Types:", role.title()));
            for (ext, count) in &stats.file_types {
                lines.push(format!("  - {ext}: {count} files"));
            }
            lines.push(format!("Total {} Lines: {}", role.title(), stats.total_lines));
        }

        lines.join("\n")
    }

    /// One artifact per role that collected any listing entry.
    pub fn listings(&self, root_name: &str) -> Vec<ListingArtifact> {
        Role::ALL
            .into_iter()
            .filter(|role| !self.role(*role).listings.is_empty())
            .map(|role| ListingArtifact {
                role,
                file_name: format!("{}_code.txt", role.name()),
                contents: format!(
                    "{} Code Listings for {}\n\n{}",
                    role.title(),
                    root_name,
                    self.role(role).listings.join("\n\n")
                ),
            })
            .collect()
    }
}

/// Listing entry holding a file's verbatim content.
pub fn listing_entry(rel_file: &str, content: &str) -> String {
    format!("### {rel_file}\n```\n{content}\n```")
}

/// Listing entry for a file that could not be read.
pub fn listing_error(rel_file: &str, error: &str) -> String {
    format!("### {rel_file}\nError reading file: {error}")
}

/// Serializable per-role counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleTotals {
    pub file_types: BTreeMap<String, usize>,
    pub total_lines: usize,
}

/// Counters for both roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub frontend: RoleTotals,
    pub backend: RoleTotals,
}

/// Rendered verbatim listing for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingArtifact {
    pub role: Role,
    /// `<role>_code.txt`
    pub file_name: String,
    pub contents: String,
}

/// Destination for listing artifacts.
pub trait ListingSink {
    fn emit(&mut self, artifact: &ListingArtifact) -> std::io::Result<()>;
}

/// Collects artifacts in memory.
impl ListingSink for Vec<ListingArtifact> {
    fn emit(&mut self, artifact: &ListingArtifact) -> std::io::Result<()> {
        self.push(artifact.clone());
        Ok(())
    }
}

/// Writes each artifact as a file inside one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ListingSink for DirectorySink {
    fn emit(&mut self, artifact: &ListingArtifact) -> std::io::Result<()> {
        let path = self.dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.contents)?;
        tracing::info!(path = %path.display(), role = %artifact.role, "wrote listing");
        self.written.push(path);
        Ok(())
    }
}

/// Result of one digest run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub root: PathBuf,
    pub root_name: String,
    /// The rendered digest.
    #[serde(rename = "report")]
    pub text: String,
    pub stats: Stats,
    #[serde(skip)]
    pub listings: Vec<ListingArtifact>,
    /// Where the listings were written, if they were written to disk.
    pub artifacts: Vec<PathBuf>,
}

impl Report {
    /// Build the report from a finished walk.
    pub fn from_aggregate(root: &Path, root_name: &str, aggregate: &Aggregate) -> Self {
        Self {
            root: root.to_path_buf(),
            root_name: root_name.to_string(),
            text: aggregate.render(root_name),
            stats: aggregate.stats(),
            listings: aggregate.listings(root_name),
            artifacts: Vec::new(),
        }
    }

    /// Hand every listing to `sink`. Failed writes are logged and skipped.
    pub fn write_listings(&self, sink: &mut dyn ListingSink) -> usize {
        let mut written = 0;
        for artifact in &self.listings {
            match sink.emit(artifact) {
                Ok(()) => written += 1,
                Err(err) => {
                    tracing::warn!(file = %artifact.file_name, %err, "could not write listing");
                }
            }
        }
        written
    }

    /// JSON document with the report, its counters and the written artifacts.
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
