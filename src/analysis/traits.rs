//! Core traits for hook discovery.

use std::path::Path;

use super::FileHooks;

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// The visitor only borrows this, so one parse can feed several passes.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// Source bytes (kept for node text extraction).
    pub source: Vec<u8>,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Whether tree-sitter had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Line (1-indexed) of the first ERROR or MISSING node, if any.
    pub fn first_error_line(&self) -> Option<usize> {
        first_error_line(self.tree.root_node())
    }
}

fn first_error_line(node: tree_sitter::Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}

/// Per-visit switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitOptions {
    /// Capture the doc comment preceding each declaration call.
    pub include_doc_comments: bool,
}

/// Language-specific hook visitor.
///
/// Each grammar whose ecosystem has a declare/subscribe hook convention
/// implements this trait. `visit` is pure: it returns what it found and
/// keeps no state between files.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create a parser
/// per call to `parse`.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "php").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Returns an error only if tree-sitter produces no tree at all.
    /// Recoverable syntax errors are left as ERROR nodes in the tree.
    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Walk a parsed file and return its hook declarations and subscriptions.
    fn visit(&self, parsed: &ParsedFile, options: VisitOptions) -> anyhow::Result<FileHooks>;

    /// Check if this analyzer handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}
