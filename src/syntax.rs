//! Syntax check of generated Go code with the tree-sitter Go grammar.

use crate::error::SyntaxError;
use tree_sitter::{Node, Parser};

/// Parse `code` as a Go source file and report the first syntax error.
///
/// This is a grammar check only: names, types and imports are not resolved.
pub fn check_go(code: &str) -> Result<(), SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|err| SyntaxError::Grammar(err.to_string()))?;

    let tree = parser.parse(code, None).ok_or(SyntaxError::Aborted)?;
    let root = tree.root_node();
    if !root.has_error() {
        return Ok(());
    }

    let Some(node) = first_error(root) else {
        return Err(SyntaxError::Invalid { line: 1, column: 1, snippet: String::new() });
    };
    let position = node.start_position();
    let snippet = code
        .get(node.byte_range())
        .unwrap_or_default()
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(40)
        .collect();

    Err(SyntaxError::Invalid {
        line: position.row + 1,
        column: position.column + 1,
        snippet,
    })
}

/// Depth-first search for the first ERROR or MISSING node
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}
