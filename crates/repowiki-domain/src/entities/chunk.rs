//! The [`Chunk`] entity — an immutable semantic unit stored solely in the
//! vector index (never mirrored in the relational store).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChunkId, RepositoryId};

/// Semantic node type of a chunk. Free-form so language-specific parsers can
/// introduce new kinds without a domain-level enum change; `<type>_part` is
/// used for sliding-window fragments produced when a chunk exceeds the token
/// budget (e.g. `function_part`).
pub type NodeType = String;

/// An immutable semantic unit of source or documentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque id, assigned at creation.
    pub id: ChunkId,
    /// Owning repository.
    pub repo_id: RepositoryId,
    /// Path relative to the repository root.
    pub file_path: String,
    /// Semantic node type (e.g. `function`, `class`, `module`,
    /// `document_section`, `constant`, or a `<type>_part` fragment).
    pub node_type: NodeType,
    /// Symbol name (function/class/section name), if any.
    pub symbol_name: Option<String>,
    /// 1-indexed inclusive start line.
    pub start_line: usize,
    /// 1-indexed inclusive end line.
    pub end_line: usize,
    /// Raw chunk content.
    pub content: String,
    /// Source language tag (e.g. `rust`, `python`, `markdown`).
    pub language: String,
    /// Parent chunk id for hierarchical structure (e.g. a method's owning class).
    pub parent_chunk_id: Option<ChunkId>,
    /// Names of symbols this chunk calls/references.
    pub called_symbols: Vec<String>,
    /// Extracted docstring/comment, if any.
    pub docstring: Option<String>,
    /// Structured metadata specific to the node type (e.g. an ORM field list).
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Chunk {
    /// Approximate token count used for the ~6000 token chunk size budget
    /// (length / 4, matching the spec's approximation).
    #[must_use]
    pub fn approx_tokens(&self) -> usize {
        self.content.len() / 4
    }

    /// Build the embedding input string: language, type, name, file path,
    /// docstring (if any), and code body concatenated in that order.
    #[must_use]
    pub fn embedding_input(&self) -> String {
        let mut parts = vec![
            self.language.clone(),
            self.node_type.clone(),
            self.symbol_name.clone().unwrap_or_default(),
            self.file_path.clone(),
        ];
        if let Some(doc) = &self.docstring {
            parts.push(doc.clone());
        }
        parts.push(self.content.clone());
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Chunk {
        Chunk {
            id: ChunkId::new(),
            repo_id: RepositoryId::new(),
            file_path: "src/lib.rs".to_owned(),
            node_type: "function".to_owned(),
            symbol_name: Some("parse".to_owned()),
            start_line: 1,
            end_line: 10,
            content: "fn parse() {}".to_owned(),
            language: "rust".to_owned(),
            parent_chunk_id: None,
            called_symbols: vec![],
            docstring: None,
            metadata: None,
        }
    }

    #[test]
    fn embedding_input_includes_identity_fields() {
        let chunk = sample();
        let input = chunk.embedding_input();
        assert!(input.contains("rust"));
        assert!(input.contains("function"));
        assert!(input.contains("parse"));
        assert!(input.contains("src/lib.rs"));
    }
}
