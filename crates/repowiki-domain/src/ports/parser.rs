//! The Parser port — turns a file's raw bytes into [`Chunk`]s.
//!
//! Concrete parsers are selected by file extension/language tag; the
//! application layer owns the registry and the sliding-window re-segmentation
//! fallback described by [`crate::constants::CHUNK_TOKEN_BUDGET`].

use async_trait::async_trait;

use crate::entities::Chunk;
use crate::error::Result;
use crate::value_objects::RepositoryId;

/// Everything a parser needs to turn one file into chunks.
#[derive(Debug, Clone)]
pub struct ParseInput<'a> {
    pub repo_id: RepositoryId,
    pub file_path: &'a str,
    pub content: &'a str,
    pub language: &'a str,
}

#[async_trait]
pub trait FileParser: Send + Sync {
    /// Language tags this parser claims (e.g. `["rust"]`, `["markdown"]`).
    fn languages(&self) -> &[&str];

    /// Parse a single file into zero or more chunks. Parsers never apply the
    /// token-budget sliding-window split themselves; that is a uniform
    /// post-processing step applied by the caller to every parser's output.
    async fn parse(&self, input: ParseInput<'_>) -> Result<Vec<Chunk>>;
}

/// Dispatches to the registered [`FileParser`] for a language, falling back
/// to a single whole-file `module` chunk when no parser claims the language.
#[async_trait]
pub trait ParserRegistry: Send + Sync {
    async fn parse_file(&self, input: ParseInput<'_>) -> Result<Vec<Chunk>>;

    /// Best-effort language tag for a path, derived from its extension.
    fn detect_language(&self, file_path: &str) -> String;
}
