//! [`RepoIndex`] — a per-repo flat catalog of files to top-level symbols,
//! derived from chunk metadata and used by retrieval planners.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::chunk::Chunk;

/// Symbol catalog for a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSymbols {
    /// Detected source language.
    pub language: String,
    /// Top-level function names.
    pub functions: Vec<String>,
    /// Top-level class names.
    pub classes: Vec<String>,
    /// Top-level constant names.
    pub constants: Vec<String>,
}

/// Per-repo flat catalog of files to top-level symbols. Rebuilt fully on full
/// processing and patched for changed paths on incremental sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoIndex {
    /// `path -> symbol catalog`.
    pub files: HashMap<String, FileSymbols>,
}

impl RepoIndex {
    /// Rebuild the whole index from a full chunk list.
    #[must_use]
    pub fn rebuild(chunks: &[Chunk]) -> Self {
        let mut index = Self::default();
        for chunk in chunks {
            index.ingest_chunk(chunk);
        }
        index
    }

    /// Patch the index with chunks belonging only to `changed_paths`,
    /// dropping any existing entries for those paths first so stale symbols
    /// from a prior version of the file don't linger.
    pub fn patch(&mut self, changed_paths: &[String], new_chunks: &[Chunk]) {
        for path in changed_paths {
            self.files.remove(path);
        }
        for chunk in new_chunks {
            if changed_paths.contains(&chunk.file_path) {
                self.ingest_chunk(chunk);
            }
        }
    }

    /// Remove entries for paths that no longer exist in the repository.
    pub fn remove_paths(&mut self, deleted_paths: &[String]) {
        for path in deleted_paths {
            self.files.remove(path);
        }
    }

    fn ingest_chunk(&mut self, chunk: &Chunk) {
        let entry = self.files.entry(chunk.file_path.clone()).or_insert_with(|| FileSymbols {
            language: chunk.language.clone(),
            ..Default::default()
        });
        let Some(name) = &chunk.symbol_name else {
            return;
        };
        match chunk.node_type.as_str() {
            "function" => entry.functions.push(name.clone()),
            "class" => entry.classes.push(name.clone()),
            "constant" => entry.constants.push(name.clone()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ChunkId, RepositoryId};

    fn chunk(path: &str, node_type: &str, name: &str) -> Chunk {
        Chunk {
            id: ChunkId::new(),
            repo_id: RepositoryId::new(),
            file_path: path.to_owned(),
            node_type: node_type.to_owned(),
            symbol_name: Some(name.to_owned()),
            start_line: 1,
            end_line: 2,
            content: String::new(),
            language: "rust".to_owned(),
            parent_chunk_id: None,
            called_symbols: vec![],
            docstring: None,
            metadata: None,
        }
    }

    #[test]
    fn patch_replaces_only_changed_paths() {
        let mut index = RepoIndex::rebuild(&[
            chunk("a.rs", "function", "foo"),
            chunk("b.rs", "function", "bar"),
        ]);
        index.patch(&["a.rs".to_owned()], &[chunk("a.rs", "function", "renamed")]);

        assert_eq!(index.files["a.rs"].functions, vec!["renamed".to_owned()]);
        assert_eq!(index.files["b.rs"].functions, vec!["bar".to_owned()]);
    }

    #[test]
    fn remove_paths_drops_deleted_files() {
        let mut index = RepoIndex::rebuild(&[chunk("a.rs", "function", "foo")]);
        index.remove_paths(&["a.rs".to_owned()]);
        assert!(!index.files.contains_key("a.rs"));
    }
}
