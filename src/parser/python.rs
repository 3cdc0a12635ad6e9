use super::StructureExtractor;
use crate::error::{AssistantError, Result};
use crate::models::{ClassInfo, FunctionInfo, Structure};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

const IMPORT_QUERY: &str = r#"
[
  (import_statement) @import
  (import_from_statement) @import
  (future_import_statement) @import
]
"#;

pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_tree(&self, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| parse_failure(format!("Failed to set Python language: {e}")))?;

        parser
            .parse(source, None)
            .ok_or_else(|| parse_failure("Failed to parse Python file".to_string()))
    }

    /// Ok when the source parses cleanly, otherwise the position of the first
    /// error or missing node.
    pub fn check_syntax(&self, source: &str) -> Result<()> {
        let tree = self.parse_tree(source)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(syntax_error(root));
        }
        Ok(())
    }

    fn process_imports(&self, root: Node, source: &str) -> Result<Vec<String>> {
        let language = tree_sitter_python::LANGUAGE.into();
        let query = Query::new(&language, IMPORT_QUERY)
            .map_err(|e| parse_failure(format!("Failed to create Python import query: {e}")))?;

        let mut nodes = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, root, source.as_bytes());
        while let Some(match_) = matches.next() {
            for capture in match_.captures {
                nodes.push(capture.node);
            }
        }
        nodes.sort_by_key(|node| node.start_byte());

        let mut imports = Vec::new();
        for node in nodes {
            match node.kind() {
                "import_statement" => {
                    for module in imported_names(node, source) {
                        imports.push(format!("import {module}"));
                    }
                }
                "import_from_statement" => {
                    let module = node
                        .child_by_field_name("module_name")
                        .and_then(|m| node_text(m, source))
                        .unwrap_or_default();
                    let mut names = imported_names(node, source);
                    if names.is_empty() && has_child_of_kind(node, "wildcard_import") {
                        names.push("*".to_string());
                    }
                    for name in names {
                        imports.push(format!("from {module} import {name}"));
                    }
                }
                "future_import_statement" => {
                    for name in imported_names(node, source) {
                        imports.push(format!("from __future__ import {name}"));
                    }
                }
                _ => {}
            }
        }

        Ok(imports)
    }

    fn process_function(&self, node: Node, source: &str) -> Option<FunctionInfo> {
        let name = node_text(node.child_by_field_name("name")?, source)?.to_string();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| positional_params(p, source))
            .unwrap_or_default();
        let docstring = node
            .child_by_field_name("body")
            .and_then(|body| extract_docstring(body, source))
            .unwrap_or_default();

        Some(FunctionInfo {
            name,
            line: node.start_position().row + 1,
            params,
            docstring,
        })
    }

    fn process_class(&self, node: Node, source: &str) -> Option<ClassInfo> {
        let name = node_text(node.child_by_field_name("name")?, source)?.to_string();
        let body = node.child_by_field_name("body");
        let docstring = body
            .and_then(|b| extract_docstring(b, source))
            .unwrap_or_default();

        let mut methods = Vec::new();
        if let Some(body) = body {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                let definition = unwrap_decorated(child);
                if definition.kind() == "function_definition" {
                    methods.extend(self.process_function(definition, source));
                }
            }
        }

        Some(ClassInfo {
            name,
            line: node.start_position().row + 1,
            docstring,
            methods,
        })
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureExtractor for PythonExtractor {
    fn extract(&self, source: &str) -> Result<Structure> {
        let tree = self.parse_tree(source)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(syntax_error(root));
        }

        let mut structure = Structure {
            imports: self.process_imports(root, source)?,
            ..Default::default()
        };

        // Top level only: nested defs and classes are not part of the summary.
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            let definition = unwrap_decorated(child);
            match definition.kind() {
                "function_definition" => {
                    structure
                        .functions
                        .extend(self.process_function(definition, source));
                }
                "class_definition" => {
                    structure
                        .classes
                        .extend(self.process_class(definition, source));
                }
                _ => {}
            }
        }

        Ok(structure)
    }
}

fn parse_failure(message: String) -> AssistantError {
    AssistantError::Parse {
        line: 0,
        column: 0,
        message,
    }
}

fn syntax_error(root: Node) -> AssistantError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing '{}'", node.kind())
    } else {
        "invalid syntax".to_string()
    };
    AssistantError::Parse {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn node_text<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    source.get(node.byte_range())
}

fn has_child_of_kind(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

fn unwrap_decorated(node: Node<'_>) -> Node<'_> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

/// Module names of the `name` fields of an import, aliases dropped.
fn imported_names(node: Node, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let names: Vec<String> = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|child| {
            let target = if child.kind() == "aliased_import" {
                child.child_by_field_name("name")?
            } else {
                child
            };
            node_text(target, source).map(str::to_string)
        })
        .collect();
    names
}

/// Parameter names up to the first `*args` or bare `*`.
fn positional_params(params: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        let name_node = match child.kind() {
            "identifier" => Some(child),
            "default_parameter" | "typed_default_parameter" => child.child_by_field_name("name"),
            "typed_parameter" => match child.named_child(0) {
                Some(inner) if inner.kind() == "identifier" => Some(inner),
                _ => break,
            },
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => None,
        };
        if let Some(text) = name_node.and_then(|n| node_text(n, source)) {
            names.push(text.to_string());
        }
    }
    names
}

fn extract_docstring(body: Node, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|node| node.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }

    let mut expr = first.named_child(0)?;
    while expr.kind() == "parenthesized_expression" {
        expr = expr.named_child(0)?;
    }
    let text = match expr.kind() {
        "string" => literal_value(node_text(expr, source)?)?,
        // Implicit concatenation: every part must itself qualify.
        "concatenated_string" => {
            let mut cursor = expr.walk();
            let parts: Option<Vec<String>> = expr
                .named_children(&mut cursor)
                .filter(|part| !part.is_extra())
                .map(|part| match part.kind() {
                    "string" => node_text(part, source).and_then(literal_value),
                    _ => None,
                })
                .collect();
            parts?.concat()
        }
        _ => return None,
    };
    Some(clean_docstring(&text))
}

/// Value of a string literal: quotes removed, escapes decoded unless raw.
fn literal_value(raw: &str) -> Option<String> {
    let inner = strip_string_literal(raw)?;
    let is_raw = raw
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .any(|c| c == 'r' || c == 'R');
    Some(if is_raw {
        inner.to_string()
    } else {
        unescape(inner)
    })
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(next),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut digits = next.to_string();
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

/// Inner text of a plain or raw string literal. Byte and f-strings are not
/// docstrings.
fn strip_string_literal(raw: &str) -> Option<&str> {
    let prefix_len = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)?;
    let prefix = &raw[..prefix_len];
    if prefix.contains(['f', 'F', 'b', 'B']) {
        return None;
    }

    let rest = &raw[prefix_len..];
    ["\"\"\"", "'''", "\"", "'"].iter().find_map(|quote| {
        if rest.len() >= quote.len() * 2 && rest.starts_with(quote) && rest.ends_with(quote) {
            rest.get(quote.len()..rest.len() - quote.len())
        } else {
            None
        }
    })
}

/// First line left-trimmed, common indentation of the rest removed, blank
/// lines at both ends dropped.
fn clean_docstring(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        cleaned.push(first.trim_start().to_string());
    }
    for line in lines.iter().skip(1) {
        let dedented = line.get(margin..).unwrap_or_else(|| line.trim_start());
        cleaned.push(dedented.trim_end().to_string());
    }

    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }
    let leading = cleaned.iter().take_while(|l| l.trim().is_empty()).count();
    cleaned.drain(..leading);

    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Structure {
        PythonExtractor::new().extract(source).unwrap()
    }

    #[test]
    fn test_parse_simple_function() {
        let source = r#"
def hello_world():
    """A simple function"""
    print("Hello, World!")
"#;
        let structure = extract(source);
        assert_eq!(structure.functions.len(), 1);
        let func = &structure.functions[0];
        assert_eq!(func.name, "hello_world");
        assert_eq!(func.line, 2);
        assert!(func.params.is_empty());
        assert_eq!(func.docstring, "A simple function");
    }

    #[test]
    fn test_one_line_function() {
        let structure = extract("def greet(name): return name\n");
        assert_eq!(structure.functions.len(), 1);
        assert_eq!(structure.functions[0].name, "greet");
        assert_eq!(structure.functions[0].line, 1);
        assert_eq!(structure.functions[0].params, vec!["name".to_string()]);
        assert_eq!(structure.functions[0].docstring, "");
    }

    #[test]
    fn test_parse_class_with_methods() {
        let source = r#"
class MyClass:
    """A simple class"""
    def method_one(self):
        pass

    @staticmethod
    def method_two(x, y=1):
        def helper():
            pass
        return x

    class Inner:
        def hidden(self):
            pass
"#;
        let structure = extract(source);
        assert!(structure.functions.is_empty());
        assert_eq!(structure.classes.len(), 1);

        let class = &structure.classes[0];
        assert_eq!(class.name, "MyClass");
        assert_eq!(class.line, 2);
        assert_eq!(class.docstring, "A simple class");

        let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["method_one", "method_two"]);
        assert_eq!(class.methods[0].params, vec!["self".to_string()]);
        assert_eq!(class.methods[1].params, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(class.methods[1].line, 8);
    }

    #[test]
    fn test_only_top_level_functions() {
        let source = r#"
def outer():
    def inner():
        pass
    return inner

@decorator
def decorated(a):
    pass

async def fetch(url):
    pass
"#;
        let structure = extract(source);
        let names: Vec<&str> = structure.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "decorated", "fetch"]);
        assert_eq!(structure.functions[1].line, 8);
    }

    #[test]
    fn test_positional_params() {
        let source = "def f(a, b: int, c=3, d: str = 'x', *args, e, f=2, **kwargs):\n    pass\n";
        let structure = extract(source);
        assert_eq!(
            structure.functions[0].params,
            vec!["a", "b", "c", "d"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );

        let structure = extract("def g(a, /, b, *, c):\n    pass\n");
        assert_eq!(
            structure.functions[0].params,
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_parse_imports() {
        let source = r#"
from __future__ import annotations
import os
import sys, json as j
from pathlib import Path
from typing import List, Dict as D
from . import sibling
from .pkg import *

def lazy():
    import re
"#;
        let structure = extract(source);
        assert_eq!(
            structure.imports,
            vec![
                "from __future__ import annotations",
                "import os",
                "import sys",
                "import json",
                "from pathlib import Path",
                "from typing import List",
                "from typing import Dict",
                "from . import sibling",
                "from .pkg import *",
                "import re",
            ]
        );
    }

    #[test]
    fn test_duplicate_imports_are_kept() {
        let structure = extract("import os\nimport os\n");
        assert_eq!(structure.imports, vec!["import os", "import os"]);
    }

    #[test]
    fn test_docstring_cleaning() {
        let source = concat!(
            "def f():\n",
            "    \"\"\"\n    Summary line.\n\n      Indented detail.\n    \"\"\"\n",
            "    pass\n"
        );
        let structure = extract(source);
        assert_eq!(
            structure.functions[0].docstring,
            "Summary line.\n\n  Indented detail."
        );

        let structure = extract("def g():\n    # comment first\n    r'raw doc'\n");
        assert_eq!(structure.functions[0].docstring, "raw doc");

        let structure = extract("def h():\n    x = 1\n    \"not a docstring\"\n");
        assert_eq!(structure.functions[0].docstring, "");
    }

    #[test]
    fn test_concatenated_docstring() {
        let structure = extract("def f():\n    \"first \" 'second'\n    pass\n");
        assert_eq!(structure.functions[0].docstring, "first second");

        let structure = extract("class A:\n    (\"Multi \"\n     \"part.\")\n");
        assert_eq!(structure.classes[0].docstring, "Multi part.");

        let structure = extract("class B:\n    \"Multi \" \\\n    \"part.\"\n");
        assert_eq!(structure.classes[0].docstring, "Multi part.");

        let structure = extract("def g():\n    \"doc \" f\"{x}\"\n");
        assert_eq!(structure.functions[0].docstring, "");
    }

    #[test]
    fn test_docstring_escapes() {
        let structure = extract("def f():\n    \"Tab\\there\\nnext \\x41\\u00e9 \\\\ \\q\"\n");
        assert_eq!(structure.functions[0].docstring, "Tab\there\nnext A\u{e9} \\ \\q");

        let structure = extract("def g():\n    r\"keep\\n raw\"\n");
        assert_eq!(structure.functions[0].docstring, "keep\\n raw");
    }

    #[test]
    fn test_malformed_source_is_parse_error() {
        let result = PythonExtractor::new().extract("def broken(:\n    pass\n");
        assert!(matches!(result, Err(AssistantError::Parse { .. })));
    }

    #[test]
    fn test_check_syntax_reports_line() {
        let extractor = PythonExtractor::new();
        assert!(extractor.check_syntax("x = 1\n").is_ok());

        match extractor.check_syntax("x = 1\ny = (2,\n") {
            Err(AssistantError::Parse { line, .. }) => assert!(line >= 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_extraction_is_pure() {
        let source = concat!(
            "import os\n\n",
            "class A:\n    def m(self):\n        pass\n\n",
            "def f(x):\n    pass\n"
        );
        assert_eq!(extract(source), extract(source));
    }

    #[test]
    fn test_strip_string_literal() {
        assert_eq!(strip_string_literal("\"\"\"doc\"\"\""), Some("doc"));
        assert_eq!(strip_string_literal("'doc'"), Some("doc"));
        assert_eq!(strip_string_literal("R\"doc\""), Some("doc"));
        assert_eq!(strip_string_literal("f\"doc\""), None);
        assert_eq!(strip_string_literal("b'doc'"), None);
    }
}
