//! Python outlines from the tree-sitter syntax tree.

use std::collections::{BTreeSet, VecDeque};

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use super::{
    inferred_purpose, with_python_parser, Outline, SourceFile, Summarizer, TRIVIAL_LINE_LIMIT,
};

/// At most this many import names are listed.
const MAX_IMPORTS: usize = 5;

/// Route decorators such as `@app.get(...)` or `@router.post(...)`.
static ROUTE_DECORATOR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"@\w+\.(?:get|post|put|delete)\b").ok());

/// Exact-parse strategy for the statement dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonSummarizer;

/// Definitions and imports collected from one module.
#[derive(Debug, Default)]
struct ModuleShape {
    classes: Vec<String>,
    functions: Vec<String>,
    imports: BTreeSet<String>,
}

impl Summarizer for PythonSummarizer {
    fn summarize(&self, file: &SourceFile<'_>) -> Option<Outline> {
        let mut outline = Outline::new(&file.file_name);

        let shape = match parse_module(file.content) {
            Ok(shape) => shape,
            Err(err) => {
                tracing::debug!(file = %file.path.display(), %err, "python parse failed");
                outline.push("Syntax error; unable to parse.");
                return Some(outline.finish(file.line_count));
            }
        };

        let has_definitions = !shape.classes.is_empty() || !shape.functions.is_empty();
        outline.entries.extend(shape.classes);
        outline.entries.extend(shape.functions);

        if !shape.imports.is_empty() {
            let shown: Vec<&str> = shape
                .imports
                .iter()
                .take(MAX_IMPORTS)
                .map(String::as_str)
                .collect();
            let more = if shape.imports.len() > MAX_IMPORTS { "..." } else { "" };
            outline.push(format!("Key Imports: {}{}", shown.join(", "), more));
        }

        if file.file_name == "main.py" {
            outline.push("Purpose: Application entry point");
        } else if has_route_decorator(file.content) {
            outline.push("Purpose: FastAPI route");
        } else if !has_definitions && file.line_count < TRIVIAL_LINE_LIMIT {
            return None;
        } else if !has_definitions {
            outline.push("Purpose: Utility or config");
        }

        Some(outline.finish(file.line_count))
    }
}

fn has_route_decorator(content: &str) -> bool {
    ROUTE_DECORATOR
        .as_ref()
        .is_some_and(|re| re.is_match(content))
}

/// Parse `content` and collect its shape, or describe why it could not be parsed.
fn parse_module(content: &str) -> Result<ModuleShape, String> {
    with_python_parser(|parser| {
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| "failed to parse".to_string())?;

        let root = tree.root_node();
        if root.has_error() {
            return Err("syntax error".to_string());
        }

        collect_shape(root, content)
    })?
}

/// Breadth-first walk over every node, definitions nested in classes,
/// functions and control flow included.
///
/// Blocks and decorator wrappers are looked through so that a definition
/// sits at the same level as its undecorated siblings. Python 2 `print`
/// and `exec` statements parse without error nodes but are rejected here.
fn collect_shape(root: Node, content: &str) -> Result<ModuleShape, String> {
    let mut shape = ModuleShape::default();
    let mut queue = VecDeque::new();
    queue.push_back(root);

    while let Some(node) = queue.pop_front() {
        match node.kind() {
            "function_definition" => {
                if let Some(line) = function_entry(node, content) {
                    shape.functions.push(line);
                }
            }
            "class_definition" => {
                if let Some(line) = class_entry(node, content) {
                    shape.classes.push(line);
                }
            }
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                collect_imports(node, content, &mut shape.imports);
            }
            "print_statement" | "exec_statement" => {
                let line = node.start_position().row + 1;
                return Err(format!("python 2 {} on line {line}", node.kind()));
            }
            _ => {}
        }
        enqueue_children(node, &mut queue);
    }

    Ok(shape)
}

fn enqueue_children<'a>(node: Node<'a>, queue: &mut VecDeque<Node<'a>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "block" => enqueue_children(child, queue),
            "decorated_definition" => match child.child_by_field_name("definition") {
                Some(definition) => queue.push_back(definition),
                None => queue.push_back(child),
            },
            _ => queue.push_back(child),
        }
    }
}

fn text<'a>(node: Node, content: &'a str) -> &'a str {
    &content[node.byte_range()]
}

fn function_entry(node: Node, content: &str) -> Option<String> {
    let name = text(node.child_by_field_name("name")?, content);
    let params = node
        .child_by_field_name("parameters")
        .map(|p| parameter_names(p, content))
        .unwrap_or_default();
    let purpose = docstring(node, content).unwrap_or_else(|| inferred_purpose(name));
    Some(format!("Function: {}({}) - {}", name, params.join(", "), purpose))
}

fn class_entry(node: Node, content: &str) -> Option<String> {
    let name = text(node.child_by_field_name("name")?, content);
    let purpose = docstring(node, content).unwrap_or_else(|| "No docstring".to_string());
    Some(format!("Class: {name} - {purpose}"))
}

/// Plain positional parameter names, `self` included.
///
/// Positional-only parameters (before `/`), `*args`, keyword-only
/// parameters and `**kwargs` are left out.
fn parameter_names<'a>(params: Node, content: &'a str) -> Vec<&'a str> {
    let mut names = Vec::new();
    let mut cursor = params.walk();

    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => names.push(text(param, content)),
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = param.child_by_field_name("name") {
                    if name.kind() == "identifier" {
                        names.push(text(name, content));
                    }
                }
            }
            "typed_parameter" => match param.named_child(0) {
                Some(inner) if inner.kind() == "identifier" => names.push(text(inner, content)),
                Some(inner) if inner.kind() == "list_splat_pattern" => break,
                _ => {}
            },
            "positional_separator" => names.clear(),
            "keyword_separator" | "list_splat_pattern" => break,
            _ => {}
        }
    }

    names
}

/// First non-blank line of a function or class docstring.
fn docstring(node: Node, content: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;

    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }

    let string = first.named_child(0)?;
    if string.kind() != "string" {
        return None;
    }

    string_body(string, content)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Text between the quotes of a string literal. Interpolated strings are
/// not docstrings and yield an empty body.
fn string_body<'a>(string: Node, content: &'a str) -> &'a str {
    let mut cursor = string.walk();
    if string.children(&mut cursor).any(|c| c.kind() == "interpolation") {
        return "";
    }

    let count = string.child_count();
    let start = string.child(0).filter(|c| c.kind() == "string_start");
    let end = count
        .checked_sub(1)
        .and_then(|last| string.child(last))
        .filter(|c| c.kind() == "string_end");

    match (start, end) {
        (Some(start), Some(end)) if start.end_byte() <= end.start_byte() => {
            &content[start.end_byte()..end.start_byte()]
        }
        _ => text(string, content)
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_matches(|c| c == '"' || c == '\''),
    }
}

/// Top-level module name of every imported symbol.
fn collect_imports(node: Node, content: &str, imports: &mut BTreeSet<String>) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let dotted = if name.kind() == "aliased_import" {
            name.child_by_field_name("name")
        } else {
            Some(name)
        };
        if let Some(dotted) = dotted {
            let head = text(dotted, content).split('.').next().unwrap_or_default().trim();
            if !head.is_empty() {
                imports.insert(head.to_string());
            }
        }
    }

    let mut cursor = node.walk();
    if node.children(&mut cursor).any(|c| c.kind() == "wildcard_import") {
        imports.insert("*".to_string());
    }
}
