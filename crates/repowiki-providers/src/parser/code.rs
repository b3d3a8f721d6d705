//! Tree-sitter backed [`FileParser`] for Rust, Python, JavaScript,
//! TypeScript, and Go. Extracts top-level functions, classes/structs, and
//! constants as chunks; everything else is left to the caller's whole-file
//! fallback.

use async_trait::async_trait;
use repowiki_domain::entities::Chunk;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::parser::{FileParser, ParseInput};
use repowiki_domain::value_objects::ChunkId;
use tree_sitter::{Node, Parser};

/// `(tree-sitter node kind, chunk node_type)` pairs searched for a language.
type NodeMapping = &'static [(&'static str, &'static str)];

fn mapping_for(language: &str) -> Option<(tree_sitter::Language, NodeMapping)> {
    match language {
        "rust" => Some((
            tree_sitter_rust::LANGUAGE.into(),
            &[
                ("function_item", "function"),
                ("struct_item", "class"),
                ("enum_item", "class"),
                ("trait_item", "class"),
                ("const_item", "constant"),
                ("static_item", "constant"),
            ],
        )),
        "python" => Some((
            tree_sitter_python::LANGUAGE.into(),
            &[
                ("function_definition", "function"),
                ("class_definition", "class"),
            ],
        )),
        "javascript" => Some((
            tree_sitter_javascript::LANGUAGE.into(),
            &[
                ("function_declaration", "function"),
                ("class_declaration", "class"),
                ("method_definition", "function"),
            ],
        )),
        "typescript" => Some((
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            &[
                ("function_declaration", "function"),
                ("class_declaration", "class"),
                ("interface_declaration", "class"),
                ("method_definition", "function"),
            ],
        )),
        "go" => Some((
            tree_sitter_go::LANGUAGE.into(),
            &[
                ("function_declaration", "function"),
                ("method_declaration", "function"),
                ("type_declaration", "class"),
                ("const_declaration", "constant"),
            ],
        )),
        _ => None,
    }
}

/// Parses source files via tree-sitter grammars into per-symbol chunks.
pub struct TreeSitterParser;

impl TreeSitterParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileParser for TreeSitterParser {
    fn languages(&self) -> &[&str] {
        &["rust", "python", "javascript", "typescript", "go"]
    }

    async fn parse(&self, input: ParseInput<'_>) -> Result<Vec<Chunk>> {
        let Some((language, mapping)) = mapping_for(input.language) else {
            return Ok(Vec::new());
        };

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| Error::internal(format!("failed to set tree-sitter language: {e}")))?;

        let source = input.content.as_bytes();
        let Some(tree) = parser.parse(source, None) else {
            return Err(Error::internal(format!(
                "tree-sitter failed to parse {}",
                input.file_path
            )));
        };

        let mut chunks = Vec::new();
        for (node_kind, node_type) in mapping {
            collect_nodes(tree.root_node(), node_kind, &mut |node| {
                if let Some(chunk) = node_to_chunk(node, source, node_type, &input) {
                    chunks.push(chunk);
                }
            });
        }
        Ok(chunks)
    }
}

fn collect_nodes<'a>(node: Node<'a>, kind: &str, visit: &mut impl FnMut(Node<'a>)) {
    if node.kind() == kind {
        visit(node);
    }
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            collect_nodes(cursor.node(), kind, visit);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn node_to_chunk(node: Node<'_>, source: &[u8], node_type: &str, input: &ParseInput<'_>) -> Option<Chunk> {
    let content = node.utf8_text(source).ok()?.to_owned();
    let symbol_name = extract_name(node, source);

    Some(Chunk {
        id: ChunkId::new(),
        repo_id: input.repo_id,
        file_path: input.file_path.to_owned(),
        node_type: node_type.to_owned(),
        symbol_name,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        content,
        language: input.language.to_owned(),
        parent_chunk_id: None,
        called_symbols: Vec::new(),
        docstring: leading_comment(node, source),
        metadata: None,
    })
}

fn extract_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    for field in ["name", "declarator"] {
        if let Some(name_node) = node.child_by_field_name(field) {
            if let Ok(text) = name_node.utf8_text(source) {
                return Some(text.to_owned());
            }
        }
    }
    None
}

/// Pull an immediately preceding `//` / `#` / `///` comment line as a
/// docstring approximation; languages with real docstring nodes would need
/// a dedicated field lookup, which none of the mapped node kinds expose.
fn leading_comment(node: Node<'_>, source: &[u8]) -> Option<String> {
    let sibling = node.prev_sibling()?;
    if !sibling.kind().contains("comment") {
        return None;
    }
    sibling.utf8_text(source).ok().map(|s| s.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use repowiki_domain::value_objects::RepositoryId;

    use super::*;

    #[tokio::test]
    async fn extracts_rust_function_and_struct() {
        let parser = TreeSitterParser::new();
        let source = "struct Foo { x: i32 }\n\nfn bar() -> i32 { 1 }\n";
        let input = ParseInput {
            repo_id: RepositoryId::new(),
            file_path: "src/lib.rs",
            content: source,
            language: "rust",
        };
        let chunks = parser.parse(input).await.unwrap();
        assert!(chunks.iter().any(|c| c.node_type == "class" && c.symbol_name.as_deref() == Some("Foo")));
        assert!(chunks.iter().any(|c| c.node_type == "function" && c.symbol_name.as_deref() == Some("bar")));
    }

    #[tokio::test]
    async fn unmapped_language_returns_empty() {
        let parser = TreeSitterParser::new();
        let input = ParseInput {
            repo_id: RepositoryId::new(),
            file_path: "x.rb",
            content: "def foo; end",
            language: "ruby",
        };
        assert!(parser.parse(input).await.unwrap().is_empty());
    }
}
