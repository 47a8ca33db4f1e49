//! Extension sets and dialect detection.
//!
//! Decides which files the digest looks at and which extraction
//! strategy applies to each of them.

use std::path::Path;

/// Extensions summarized with the bracket dialect.
pub const FRONTEND_EXTS: &[&str] = &[".js", ".jsx", ".ts", ".tsx"];

/// Extensions summarized with the statement dialect.
pub const BACKEND_EXTS: &[&str] = &[".py"];

/// Configuration extensions (package.json, vite.config.js, ...).
pub const CONFIG_EXTS: &[&str] = &[".json", ".js"];

/// Extensions that render as React components.
pub const COMPONENT_EXTS: &[&str] = &[".jsx", ".tsx"];

/// Source family of a file, selecting how it is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Statement/definition oriented source (Python). Parsed exactly.
    Statement,
    /// Bracket/expression oriented source (JavaScript, TypeScript, JSX, TSX).
    /// Scanned with patterns, best-effort only.
    Bracket,
    /// Configuration data. Never structurally extracted.
    Config,
}

impl Dialect {
    /// Map a lowercase extension (with leading dot) to its dialect.
    ///
    /// `.js` is both a frontend and a config extension; it resolves to
    /// [`Dialect::Bracket`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        if BACKEND_EXTS.contains(&ext) {
            Some(Dialect::Statement)
        } else if FRONTEND_EXTS.contains(&ext) {
            Some(Dialect::Bracket)
        } else if CONFIG_EXTS.contains(&ext) {
            Some(Dialect::Config)
        } else {
            None
        }
    }

    /// Detect the dialect of a path from its extension.
    pub fn detect(path: &Path) -> Option<Self> {
        extension_of(path).and_then(|ext| Self::from_extension(&ext))
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Statement => write!(f, "statement"),
            Dialect::Bracket => write!(f, "bracket"),
            Dialect::Config => write!(f, "config"),
        }
    }
}

/// Lowercase extension with its leading dot, e.g. `".py"`.
///
/// Dotfiles such as `.babelrc` have no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Key used for per-extension counters.
pub fn extension_key(path: &Path) -> String {
    extension_of(path).unwrap_or_else(|| ".no_ext".to_string())
}

/// Whether the extension belongs to any recognized set.
pub fn is_recognized(ext: &str) -> bool {
    FRONTEND_EXTS.contains(&ext) || BACKEND_EXTS.contains(&ext) || CONFIG_EXTS.contains(&ext)
}

/// Whether a path has a recognized extension.
pub fn passes_extension_filter(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| is_recognized(&ext))
}

/// Configuration-category file whose name mentions "config".
///
/// These are reported in the separate configuration section instead of
/// their directory's outline block.
pub fn is_config_note(path: &Path) -> bool {
    let named_config = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains("config"))
        .unwrap_or(false);
    named_config && extension_of(path).is_some_and(|ext| CONFIG_EXTS.contains(&ext.as_str()))
}
