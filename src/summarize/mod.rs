//! Per-file structural outlines.
//!
//! Each supported dialect has its own [`Summarizer`]:
//!
//! - [`PythonSummarizer`] parses the file with tree-sitter and reads
//!   definitions, docstrings and imports straight from the syntax tree.
//! - [`ScriptSummarizer`] scans JavaScript/TypeScript with regular
//!   expressions. It is best-effort: unusual declaration shapes are missed
//!   and the occasional false positive is expected.
//! - [`ConfigSummarizer`] only tags the file and counts its lines.
//!
//! A summarizer returns `None` when a file is too trivial to describe.
//! Such files are still counted and listed by the pipeline.

mod python;
mod script;

use std::cell::RefCell;
use std::path::Path;

use smallvec::SmallVec;
use tree_sitter::Parser;

use crate::filter::{extension_of, Dialect};

pub use python::PythonSummarizer;
pub use script::ScriptSummarizer;

// One parser per thread; grammar loading can fail, so initialization
// errors are returned rather than unwrapped.
thread_local! {
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_python_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|_| ())?;
    Ok(p)
}

/// Execute a function with a cached Python parser.
pub(crate) fn with_python_parser<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce(&mut Parser) -> R,
{
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let parser =
                init_python_parser().map_err(|()| "failed to initialize parser".to_string())?;
            *slot = Some(parser);
        }

        let parser = slot
            .as_mut()
            .ok_or_else(|| "failed to initialize parser".to_string())?;
        Ok(f(parser))
    })
}

/// Below this many lines, a file without definitions is not described.
pub const TRIVIAL_LINE_LIMIT: usize = 5;

/// Structural summary of one file.
///
/// Rendered as a `File: <name>` line followed by one `  - <entry>` line
/// per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    pub file_name: String,
    pub entries: SmallVec<[String; 8]>,
}

impl Outline {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            entries: SmallVec::new(),
        }
    }

    /// Append an entry line.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Outline for a file whose content could not be read as text.
    pub fn read_error(file_name: impl Into<String>, error: &str) -> Self {
        let mut outline = Self::new(file_name);
        outline.push(format!("Error reading file: {error}"));
        outline
    }

    /// Append the trailing `Lines: N` entry.
    pub(crate) fn finish(mut self, line_count: usize) -> Self {
        self.push(format!("Lines: {line_count}"));
        self
    }

    /// All rendered lines, file name first.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(format!("File: {}", self.file_name))
            .chain(self.entries.iter().map(|e| format!("  - {e}")))
    }

    pub fn render(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}

impl std::fmt::Display for Outline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// A decoded file handed to a summarizer.
#[derive(Debug, Clone)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    pub file_name: String,
    /// Lowercase extension with leading dot, empty if none.
    pub extension: String,
    pub content: &'a str,
    pub line_count: usize,
}

impl<'a> SourceFile<'a> {
    pub fn new(path: &'a Path, content: &'a str) -> Self {
        Self {
            path,
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: extension_of(path).unwrap_or_default(),
            content,
            line_count: count_lines(content),
        }
    }
}

/// Number of lines, counting an unterminated last line.
pub fn count_lines(content: &str) -> usize {
    content.lines().count()
}

/// Derive a purpose description from an identifier.
pub(crate) fn inferred_purpose(name: &str) -> String {
    format!("Purpose inferred: {}", name.replace('_', " "))
}

/// Extraction strategy for one dialect.
pub trait Summarizer {
    /// Outline for `file`, or `None` if it is not worth reporting.
    fn summarize(&self, file: &SourceFile<'_>) -> Option<Outline>;
}

/// Strategy for configuration data: a purpose tag and the line count.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSummarizer;

impl Summarizer for ConfigSummarizer {
    fn summarize(&self, file: &SourceFile<'_>) -> Option<Outline> {
        let mut outline = Outline::new(&file.file_name);
        outline.push("Purpose: Configuration file");
        Some(outline.finish(file.line_count))
    }
}

/// Strategy for a dialect.
pub fn summarizer_for(dialect: Dialect) -> &'static dyn Summarizer {
    match dialect {
        Dialect::Statement => &PythonSummarizer,
        Dialect::Bracket => &ScriptSummarizer,
        Dialect::Config => &ConfigSummarizer,
    }
}

/// Summarize a file's content according to its dialect.
///
/// An empty `__init__.py` is never described.
pub fn summarize(path: &Path, content: &str, dialect: Dialect) -> Option<Outline> {
    let file = SourceFile::new(path, content);
    if file.line_count == 0 && file.file_name == "__init__.py" {
        return None;
    }
    summarizer_for(dialect).summarize(&file)
}

/// Summarize a file, detecting its dialect from the extension.
pub fn summarize_path(path: &Path, content: &str) -> Option<Outline> {
    Dialect::detect(path).and_then(|dialect| summarize(path, content, dialect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_render() {
        let mut outline = Outline::new("app.py");
        outline.push("Function: run() - Purpose inferred: run");
        let outline = outline.finish(3);
        assert_eq!(
            outline.render(),
            "File: app.py\n  - Function: run() - Purpose inferred: run\n  - Lines: 3"
        );
        assert_eq!(outline.lines().next().unwrap(), "File: app.py");
    }

    #[test]
    fn test_read_error_outline() {
        let outline = Outline::read_error("blob.py", "stream did not contain valid UTF-8");
        assert_eq!(
            outline.to_string(),
            "File: blob.py\n  - Error reading file: stream did not contain valid UTF-8"
        );
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\n"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\r\nb\r\n"), 2);
        assert_eq!(count_lines("\n\n"), 2);
    }

    #[test]
    fn test_inferred_purpose() {
        assert_eq!(inferred_purpose("load_user_data"), "Purpose inferred: load user data");
        assert_eq!(inferred_purpose("foo"), "Purpose inferred: foo");
    }

    #[test]
    fn test_config_outline() {
        let outline = summarize(Path::new("package.json"), "{\n  \"name\": \"x\"\n}\n", Dialect::Config).unwrap();
        assert_eq!(outline.entries.as_slice(), ["Purpose: Configuration file", "Lines: 3"]);
    }

    #[test]
    fn test_empty_init_suppressed() {
        assert!(summarize(Path::new("pkg/__init__.py"), "", Dialect::Statement).is_none());
    }

    #[test]
    fn test_summarize_path_unknown_extension() {
        assert!(summarize_path(Path::new("README.md"), "# readme\n").is_none());
    }

    #[test]
    fn test_summarize_path_dispatch() {
        let outline = summarize_path(Path::new("tsconfig.json"), "{}").unwrap();
        assert_eq!(outline.file_name, "tsconfig.json");
        assert_eq!(outline.entries[0], "Purpose: Configuration file");
    }
}
