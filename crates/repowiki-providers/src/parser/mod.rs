//! Parser registry and concrete [`FileParser`] implementations.

mod code;
mod config;
mod markdown;

pub use code::TreeSitterParser;
pub use config::ConfigParser;
pub use markdown::MarkdownParser;

use std::sync::Arc;

use async_trait::async_trait;
use repowiki_domain::entities::Chunk;
use repowiki_domain::error::Result;
use repowiki_domain::ports::parser::{FileParser, ParseInput, ParserRegistry};
use repowiki_domain::value_objects::ChunkId;

/// Holds every registered [`FileParser`] and dispatches by language tag.
/// When no parser claims a language, `parse_file` falls back to a single
/// whole-file `module` chunk so every tracked file still produces at least
/// one embeddable unit.
pub struct DefaultParserRegistry {
    parsers: Vec<Arc<dyn FileParser>>,
}

impl DefaultParserRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Arc::new(TreeSitterParser::new()),
                Arc::new(MarkdownParser::new()),
                Arc::new(ConfigParser::new()),
            ],
        }
    }

    fn parser_for(&self, language: &str) -> Option<&Arc<dyn FileParser>> {
        self.parsers.iter().find(|p| p.languages().contains(&language))
    }
}

impl Default for DefaultParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParserRegistry for DefaultParserRegistry {
    async fn parse_file(&self, input: ParseInput<'_>) -> Result<Vec<Chunk>> {
        if let Some(parser) = self.parser_for(input.language) {
            let chunks = parser.parse(input.clone()).await?;
            if !chunks.is_empty() {
                return Ok(chunks);
            }
        }
        Ok(vec![whole_file_chunk(&input)])
    }

    fn detect_language(&self, file_path: &str) -> String {
        let ext = file_path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "rs" => "rust",
            "py" => "python",
            "js" | "mjs" | "cjs" | "jsx" => "javascript",
            "ts" | "tsx" => "typescript",
            "go" => "go",
            "md" | "markdown" => "markdown",
            "toml" | "yaml" | "yml" | "json" => "config",
            _ => "plaintext",
        }
        .to_owned()
    }
}

fn whole_file_chunk(input: &ParseInput<'_>) -> Chunk {
    Chunk {
        id: ChunkId::new(),
        repo_id: input.repo_id,
        file_path: input.file_path.to_owned(),
        node_type: "module".to_owned(),
        symbol_name: None,
        start_line: 1,
        end_line: input.content.lines().count().max(1),
        content: input.content.to_owned(),
        language: input.language.to_owned(),
        parent_chunk_id: None,
        called_symbols: Vec::new(),
        docstring: None,
        metadata: None,
    }
}

#[cfg(test)]
mod tests {
    use repowiki_domain::value_objects::RepositoryId;

    use super::*;

    #[tokio::test]
    async fn unclaimed_language_falls_back_to_whole_file_chunk() {
        let registry = DefaultParserRegistry::new();
        let input = ParseInput {
            repo_id: RepositoryId::new(),
            file_path: "README.txt",
            content: "hello\nworld\n",
            language: "plaintext",
        };
        let chunks = registry.parse_file(input).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].node_type, "module");
    }

    #[test]
    fn detect_language_maps_common_extensions() {
        let registry = DefaultParserRegistry::new();
        assert_eq!(registry.detect_language("src/lib.rs"), "rust");
        assert_eq!(registry.detect_language("app/main.tsx"), "typescript");
        assert_eq!(registry.detect_language("docs/readme.MD"), "markdown");
        assert_eq!(registry.detect_language("Cargo.toml"), "config");
        assert_eq!(registry.detect_language("LICENSE"), "plaintext");
    }
}
