//! Import target discovery.
//!
//! Each grammar is walked once in document order and the module specifiers
//! it references are collected as slash-separated targets. Duplicates are
//! dropped, keeping the first occurrence.

use std::path::Path;

use tree_sitter::Node;

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::parser::Parser;

/// Path prefixes that only anchor a Rust `use` path.
const RUST_ANCHORS: &[&str] = &["crate", "self", "super"];

/// Node kinds that spell a complete Rust path inside a `use` tree.
const RUST_PATH_KINDS: &[&str] = &[
    "identifier",
    "scoped_identifier",
    "self",
    "crate",
    "super",
    "metavariable",
];

/// Returns the import targets referenced by `source`.
///
/// Rust paths are reported at every module depth (`utils/helpers/format`,
/// `utils/helpers`, `utils`) because the item name is rarely a file. Python
/// dotted names become slash-separated and relative dots are dropped.
/// ECMAScript specifiers are reported as written, without quotes.
///
/// # Errors
///
/// Returns an error if the grammar cannot be loaded or the parser produces
/// no tree.
pub fn extract_imports(
    language: SupportedLanguage,
    source: &str,
) -> Result<Vec<String>, SyntaxError> {
    let mut parser = Parser::new(language)?;
    let parsed = parser.parse(source)?;
    let mut targets = Targets::default();

    let mut stack = vec![parsed.root_node()];
    while let Some(node) = stack.pop() {
        match language {
            SupportedLanguage::Rust => collect_rust(node, source, &mut targets),
            SupportedLanguage::Python => collect_python(node, source, &mut targets),
            SupportedLanguage::TypeScript | SupportedLanguage::JavaScript => {
                collect_ecmascript(node, source, &mut targets);
            }
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    Ok(targets.into_vec())
}

/// Returns the import targets of a file, choosing the grammar by extension.
///
/// Files in languages without a grammar have no imports.
///
/// # Errors
///
/// Returns an error if the grammar cannot be loaded or the parser produces
/// no tree.
pub fn extract_imports_for_path(path: &Path, source: &str) -> Result<Vec<String>, SyntaxError> {
    match SupportedLanguage::from_path(path) {
        Some(language) => extract_imports(language, source),
        None => Ok(Vec::new()),
    }
}

#[derive(Default)]
struct Targets(Vec<String>);

impl Targets {
    fn push(&mut self, target: String) {
        if !target.is_empty() && !self.0.contains(&target) {
            self.0.push(target);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

fn text<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok().map(str::trim)
}

fn collect_rust(node: Node<'_>, source: &str, targets: &mut Targets) {
    match node.kind() {
        "use_declaration" => {
            let Some(argument) = node.child_by_field_name("argument") else {
                return;
            };
            let mut paths = Vec::new();
            rust_use_paths(argument, source, "", &mut paths);
            for path in paths {
                push_rust_path(&path, targets);
            }
        }
        "mod_item" if node.child_by_field_name("body").is_none() => {
            if let Some(name) = node
                .child_by_field_name("name")
                .and_then(|name| text(name, source))
            {
                targets.push(name.to_owned());
            }
        }
        _ => {}
    }
}

/// Expands a `use` tree into the full paths it names.
fn rust_use_paths(node: Node<'_>, source: &str, prefix: &str, paths: &mut Vec<String>) {
    match node.kind() {
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                rust_use_paths(path, source, prefix, paths);
            }
        }
        "use_wildcard" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next();
            match inner {
                Some(path) => rust_use_paths(path, source, prefix, paths),
                None => paths.push(prefix.to_owned()),
            }
        }
        "scoped_use_list" => {
            let nested = node
                .child_by_field_name("path")
                .and_then(|path| text(path, source))
                .map_or_else(|| prefix.to_owned(), |path| join_rust(prefix, path));
            if let Some(list) = node.child_by_field_name("list") {
                rust_use_paths(list, source, &nested, paths);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                rust_use_paths(child, source, prefix, paths);
            }
        }
        kind if RUST_PATH_KINDS.contains(&kind) => {
            if let Some(path) = text(node, source) {
                paths.push(join_rust(prefix, path));
            }
        }
        _ => {}
    }
}

fn join_rust(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_owned()
    } else {
        format!("{prefix}::{path}")
    }
}

fn push_rust_path(path: &str, targets: &mut Targets) {
    let mut segments: Vec<&str> = path
        .split("::")
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .skip_while(|segment| RUST_ANCHORS.contains(segment))
        .collect();
    if segments.last() == Some(&"self") {
        segments.pop();
    }

    for depth in (1..=segments.len()).rev() {
        if let Some(module) = segments.get(..depth) {
            targets.push(module.join("/"));
        }
    }
}

fn collect_python(node: Node<'_>, source: &str, targets: &mut Targets) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                if let Some(module) = python_name(name, source) {
                    targets.push(dotted_to_path(module));
                }
            }
        }
        "import_from_statement" => {
            let base = node
                .child_by_field_name("module_name")
                .and_then(|module| text(module, source))
                .map(|module| dotted_to_path(module.trim_start_matches('.')))
                .unwrap_or_default();
            targets.push(base.clone());

            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                let Some(imported) = python_name(name, source) else {
                    continue;
                };
                let module = dotted_to_path(imported);
                if base.is_empty() {
                    targets.push(module);
                } else {
                    targets.push(format!("{base}/{module}"));
                }
            }
        }
        _ => {}
    }
}

fn python_name<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    if node.kind() == "aliased_import" {
        node.child_by_field_name("name")
            .and_then(|name| text(name, source))
    } else {
        text(node, source)
    }
}

fn dotted_to_path(dotted: &str) -> String {
    dotted
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn collect_ecmascript(node: Node<'_>, source: &str, targets: &mut Targets) {
    match node.kind() {
        "import_statement" | "export_statement" => {
            if let Some(specifier) = node
                .child_by_field_name("source")
                .and_then(|string| string_value(string, source))
            {
                targets.push(specifier.to_owned());
            }
        }
        "call_expression" if is_module_call(node, source) => {
            let Some(arguments) = node.child_by_field_name("arguments") else {
                return;
            };
            let mut cursor = arguments.walk();
            let first = arguments.named_children(&mut cursor).next();
            if let Some(specifier) = first.and_then(|argument| string_value(argument, source)) {
                targets.push(specifier.to_owned());
            }
        }
        _ => {}
    }
}

/// Returns whether a call is `require(...)` or a dynamic `import(...)`.
fn is_module_call(node: Node<'_>, source: &str) -> bool {
    node.child_by_field_name("function")
        .is_some_and(|function| {
            function.kind() == "import"
                || (function.kind() == "identifier" && text(function, source) == Some("require"))
        })
}

fn string_value<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    if node.kind() != "string" {
        return None;
    }
    text(node, source).map(|quoted| quoted.trim_matches(|ch| matches!(ch, '"' | '\'' | '`')))
}
