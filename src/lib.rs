//! Codebrief - Summarize a full-stack source tree for humans and LLMs.
//!
//! Codebrief walks a project top-down, sorts each directory into the
//! frontend or backend role, and produces a plain-text report that
//! outlines every Python and JavaScript/TypeScript file along with
//! per-role file-type counts and line totals. Verbatim per-role code
//! listings are written next to the project as `frontend_code.txt` and
//! `backend_code.txt`.
//!
//! # Quick Start
//!
//! ```no_run
//! use codebrief::builder::Digest;
//!
//! let report = Digest::new("./my-app")
//!     .exclude_dirs(["migrations"])
//!     .run()
//!     .unwrap();
//!
//! println!("{}", report.text);
//! for artifact in &report.artifacts {
//!     println!("Generated {}", artifact.display());
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Per-run configuration and role classification
//! - [`filter`] - Recognized extensions and dialect detection
//! - [`gitignore`] - Root ignore-file matching
//! - [`walker`] - Top-down directory traversal
//! - [`summarize`] - Per-file outlines (tree-sitter for Python, patterns for JS/TS)
//! - [`report`] - Aggregation, report rendering and listing artifacts
//! - [`builder`] - Fluent API and the digest pipeline
//! - [`tokens`] - Token estimates for LLM context budgets

pub mod config;
pub mod filter;
pub mod gitignore;
pub mod walker;
pub mod summarize;
pub mod report;
pub mod builder;
pub mod tokens;
pub mod errors;

// Re-export key types at crate root for convenience
pub use builder::{build_report, Digest};
pub use config::{ProjectConfig, Role};
pub use errors::DigestError;
pub use filter::Dialect;
pub use gitignore::IgnoreMatcher;
pub use report::{Aggregate, ListingArtifact, ListingSink, OutputError, Report};
pub use summarize::{summarize, Outline, Summarizer};
pub use tokens::{count_tokens, Encoding, TokenEstimate};
pub use walker::WalkError;
