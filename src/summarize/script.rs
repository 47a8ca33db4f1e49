//! JavaScript/TypeScript outlines from pattern matching.
//!
//! There is no parser behind this strategy. Function declarations are
//! recognized in exactly three shapes:
//!
//! 1. `function name(params) {` (with optional `async`/`export` before it)
//! 2. `const|let|var name = [async] function [inner](params) {`
//! 3. `const|let|var name = [async] (params) =>`
//!
//! TypeScript annotations between the closing parenthesis and the body
//! are tolerated. Parameter lists containing a `)` (nested calls in
//! defaults, function-typed params) are not recognized, and declarations
//! inside strings or comments are reported as if they were code.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::filter::COMPONENT_EXTS;

use super::{inferred_purpose, Outline, SourceFile, Summarizer, TRIVIAL_LINE_LIMIT};

static FUNCTION_DECL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(concat!(
        r"\bfunction\s*\*?\s+(?P<fn_name>[A-Za-z_$][\w$]*)\s*\((?P<fn_params>[^)]*)\)\s*(?::[^{=;]*)?\{",
        r"|\b(?:const|let|var)\s+(?P<expr_name>[A-Za-z_$][\w$]*)\s*(?::[^=;]*)?=\s*(?:async\s+)?function\b\s*\*?\s*(?:[A-Za-z_$][\w$]*)?\s*\((?P<expr_params>[^)]*)\)\s*(?::[^{=;]*)?\{",
        r"|\b(?:const|let|var)\s+(?P<arrow_name>[A-Za-z_$][\w$]*)\s*(?::[^=;]*)?=\s*(?:async\s+)?\((?P<arrow_params>[^)]*)\)\s*(?::[^=;{]*)?=>",
    ))
    .ok()
});

static CLASS_DECL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)").ok());

static COMMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\*[\s\S]*?\*/|//[^\n]*").ok());

/// File names of the bundler entry module.
const ENTRY_FILES: &[&str] = &["main.jsx", "main.js"];

/// Best-effort strategy for the bracket dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptSummarizer;

/// A matched function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FunctionMatch<'a> {
    name: &'a str,
    params: &'a str,
    start: usize,
}

impl Summarizer for ScriptSummarizer {
    fn summarize(&self, file: &SourceFile<'_>) -> Option<Outline> {
        let mut outline = Outline::new(&file.file_name);

        if ENTRY_FILES.contains(&file.file_name.as_str()) {
            outline.push("Purpose: Frontend entry point");
            if mounts_react(file.content) {
                outline.push("Initializes: React application");
            }
            return Some(outline.finish(file.line_count));
        }

        let functions = find_functions(file.content);
        for func in &functions {
            let purpose = preceding_comment(file.content, func.start)
                .unwrap_or_else(|| inferred_purpose(func.name));
            outline.push(format!("Function: {}({}) - {}", func.name, func.params.trim(), purpose));
        }

        let classes = find_classes(file.content);
        for name in &classes {
            outline.push(format!("Class: {name} - Component or utility class"));
        }

        let has_definitions = !functions.is_empty() || !classes.is_empty();
        if COMPONENT_EXTS.contains(&file.extension.as_str()) && file.content.contains("return (") {
            outline.push("Purpose: React component");
        } else if !has_definitions && file.line_count < TRIVIAL_LINE_LIMIT {
            return None;
        } else if !has_definitions {
            outline.push("Purpose: Utility or script");
        }

        Some(outline.finish(file.line_count))
    }
}

fn mounts_react(content: &str) -> bool {
    content.contains("ReactDOM") || content.contains("createRoot(")
}

fn find_functions(content: &str) -> Vec<FunctionMatch<'_>> {
    let Some(re) = FUNCTION_DECL.as_ref() else {
        return Vec::new();
    };

    re.captures_iter(content)
        .filter_map(|caps| function_match(&caps))
        .collect()
}

fn function_match<'a>(caps: &Captures<'a>) -> Option<FunctionMatch<'a>> {
    let start = caps.get(0)?.start();
    [
        ("fn_name", "fn_params"),
        ("expr_name", "expr_params"),
        ("arrow_name", "arrow_params"),
    ]
    .iter()
    .find_map(|(name, params)| {
        Some(FunctionMatch {
            name: caps.name(name)?.as_str(),
            params: caps.name(params)?.as_str(),
            start,
        })
    })
}

fn find_classes(content: &str) -> Vec<&str> {
    let Some(re) = CLASS_DECL.as_ref() else {
        return Vec::new();
    };

    re.captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// First line of the nearest comment that ends before `offset`.
fn preceding_comment(content: &str, offset: usize) -> Option<String> {
    let re = COMMENT.as_ref()?;
    let raw = re.find_iter(&content[..offset]).last()?.as_str();
    comment_text(raw)
}

/// Comment text without its markers, reduced to the first non-blank line.
fn comment_text(raw: &str) -> Option<String> {
    let body = match raw.strip_prefix("/*") {
        Some(inner) => inner.strip_suffix("*/").unwrap_or(inner),
        None => raw.trim_start_matches('/'),
    };

    body.lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn outline(name: &str, code: &str) -> Option<Outline> {
        ScriptSummarizer.summarize(&SourceFile::new(Path::new(name), code))
    }

    fn entries(name: &str, code: &str) -> Vec<String> {
        outline(name, code).unwrap().entries.to_vec()
    }

    #[test]
    fn test_react_component() {
        let code = "function Bar() {\n  return (<div/>);\n}\nexport default Bar;\n";
        let e = entries("App.jsx", code);
        assert_eq!(
            e,
            vec![
                "Function: Bar() - Purpose inferred: Bar",
                "Purpose: React component",
                "Lines: 4",
            ]
        );
    }

    #[test]
    fn test_three_declaration_shapes() {
        let code = r#"
export async function fetchUser(id) {
  return api.get(id);
}

const formatName = function (first, last) {
  return first + last;
};

let add_all = async (a, b) => a + b;

const typed = (x: number): number => x * 2;
"#;
        let e = entries("utils.ts", code);
        assert_eq!(e[0], "Function: fetchUser(id) - Purpose inferred: fetchUser");
        assert_eq!(e[1], "Function: formatName(first, last) - Purpose inferred: formatName");
        assert_eq!(e[2], "Function: add_all(a, b) - Purpose inferred: add all");
        assert_eq!(e[3], "Function: typed(x: number) - Purpose inferred: typed");
        assert_eq!(e.len(), 5);
    }

    #[test]
    fn test_comments_become_purpose() {
        let code = r#"
/**
 * Loads the current session.
 * @returns {Session}
 */
function loadSession() {
  return null;
}

// Clears cached state
const reset = () => {};
"#;
        let e = entries("session.js", code);
        assert_eq!(e[0], "Function: loadSession() - Loads the current session.");
        assert_eq!(e[1], "Function: reset() - Clears cached state");
    }

    #[test]
    fn test_classes() {
        let code = "export class Store extends Base {\n  get() {}\n}\n\nclass Cache {}\n";
        let e = entries("store.ts", code);
        assert_eq!(e[0], "Class: Store - Component or utility class");
        assert_eq!(e[1], "Class: Cache - Component or utility class");
        assert_eq!(e[2], "Lines: 5");
    }

    #[test]
    fn test_entry_point() {
        let code = "import ReactDOM from 'react-dom/client';\nReactDOM.createRoot(el).render(<App />);\n";
        let e = entries("main.jsx", code);
        assert_eq!(
            e,
            vec![
                "Purpose: Frontend entry point",
                "Initializes: React application",
                "Lines: 2",
            ]
        );
    }

    #[test]
    fn test_entry_point_without_react() {
        let e = entries("main.js", "");
        assert_eq!(e, vec!["Purpose: Frontend entry point", "Lines: 0"]);
    }

    #[test]
    fn test_trivial_file_suppressed() {
        assert!(outline("index.js", "export * from './api';\n").is_none());
        assert!(outline("types.ts", "").is_none());
    }

    #[test]
    fn test_longer_script_without_definitions() {
        let code = "import a from 'a';\nimport b from 'b';\n\na.use(b);\na.start();\n";
        assert_eq!(entries("boot.ts", code), vec!["Purpose: Utility or script", "Lines: 5"]);
    }

    #[test]
    fn test_return_paren_only_matters_for_components() {
        let code = "function f() {\n  return (1);\n}\n";
        let e = entries("f.js", code);
        assert_eq!(e, vec!["Function: f() - Purpose inferred: f", "Lines: 3"]);
    }

    #[test]
    fn test_comment_text_cleanup() {
        assert_eq!(comment_text("// hello ").as_deref(), Some("hello"));
        assert_eq!(comment_text("/* one */").as_deref(), Some("one"));
        assert_eq!(comment_text("/**\n * \n * two\n */").as_deref(), Some("two"));
        assert_eq!(comment_text("//").as_deref(), None);
    }
}
