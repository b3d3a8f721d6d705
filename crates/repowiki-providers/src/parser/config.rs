//! Config-file [`FileParser`] for TOML/YAML/JSON-ish manifests. Produces one
//! `config_section` chunk per top-level table/key so a wiki page can cite a
//! specific section instead of an entire manifest.

use async_trait::async_trait;
use repowiki_domain::entities::Chunk;
use repowiki_domain::error::Result;
use repowiki_domain::ports::parser::{FileParser, ParseInput};
use repowiki_domain::value_objects::ChunkId;

pub struct ConfigParser;

impl ConfigParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileParser for ConfigParser {
    fn languages(&self) -> &[&str] {
        &["config"]
    }

    async fn parse(&self, input: ParseInput<'_>) -> Result<Vec<Chunk>> {
        let sections = split_top_level_sections(input.content);
        Ok(sections
            .into_iter()
            .map(|section| Chunk {
                id: ChunkId::new(),
                repo_id: input.repo_id,
                file_path: input.file_path.to_owned(),
                node_type: "config_section".to_owned(),
                symbol_name: section.name,
                start_line: section.start_line,
                end_line: section.end_line,
                content: section.body,
                language: input.language.to_owned(),
                parent_chunk_id: None,
                called_symbols: Vec::new(),
                docstring: None,
                metadata: None,
            })
            .collect())
    }
}

struct RawSection {
    name: Option<String>,
    body: String,
    start_line: usize,
    end_line: usize,
}

/// Groups lines by TOML `[table]`/`[[array_table]]` headers, or by top-level
/// (non-indented) keys for YAML/JSON-like files. Good enough to localize a
/// wiki citation to a region of the file; not a real parser for any format.
fn split_top_level_sections(content: &str) -> Vec<RawSection> {
    let mut sections: Vec<RawSection> = Vec::new();
    let mut preamble = String::new();
    let mut preamble_start = 1;

    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim_start();
        let is_toml_header = trimmed.starts_with('[') && trimmed.contains(']');
        let is_top_level_key = !line.is_empty()
            && !line.starts_with(' ')
            && !line.starts_with('\t')
            && !line.starts_with('#')
            && line.contains(':');

        if is_toml_header || is_top_level_key {
            if let Some(last) = sections.last_mut() {
                last.end_line = lineno.saturating_sub(1).max(last.start_line);
            } else if !preamble.trim().is_empty() {
                sections.push(RawSection {
                    name: None,
                    body: std::mem::take(&mut preamble),
                    start_line: preamble_start,
                    end_line: lineno.saturating_sub(1).max(preamble_start),
                });
            }
            let name = if is_toml_header {
                trimmed.trim_matches(|c| c == '[' || c == ']').to_owned()
            } else {
                trimmed.split(':').next().unwrap_or(trimmed).trim().to_owned()
            };
            sections.push(RawSection {
                name: Some(name),
                body: String::new(),
                start_line: lineno,
                end_line: lineno,
            });
            if let Some(last) = sections.last_mut() {
                last.body.push_str(line);
                last.body.push('\n');
            }
        } else if let Some(last) = sections.last_mut() {
            last.body.push_str(line);
            last.body.push('\n');
            last.end_line = lineno;
        } else {
            if preamble.is_empty() {
                preamble_start = lineno;
            }
            preamble.push_str(line);
            preamble.push('\n');
        }
    }

    if sections.is_empty() && !preamble.trim().is_empty() {
        let end_line = preamble.lines().count().max(preamble_start);
        sections.push(RawSection {
            name: None,
            body: preamble,
            start_line: preamble_start,
            end_line,
        });
    }

    sections.retain(|s| !s.body.trim().is_empty());
    sections
}

#[cfg(test)]
mod tests {
    use repowiki_domain::value_objects::RepositoryId;

    use super::*;

    #[tokio::test]
    async fn splits_toml_tables() {
        let parser = ConfigParser::new();
        let source = "[package]\nname = \"x\"\n\n[dependencies]\nserde = \"1\"\n";
        let input = ParseInput {
            repo_id: RepositoryId::new(),
            file_path: "Cargo.toml",
            content: source,
            language: "config",
        };
        let chunks = parser.parse(input).await.unwrap();
        assert!(chunks.iter().any(|c| c.symbol_name.as_deref() == Some("package")));
        assert!(chunks.iter().any(|c| c.symbol_name.as_deref() == Some("dependencies")));
    }

    #[tokio::test]
    async fn splits_yaml_top_level_keys() {
        let parser = ConfigParser::new();
        let source = "name: ci\non:\n  push: {}\njobs:\n  build:\n    steps: []\n";
        let input = ParseInput {
            repo_id: RepositoryId::new(),
            file_path: ".github/workflows/ci.yml",
            content: source,
            language: "config",
        };
        let chunks = parser.parse(input).await.unwrap();
        assert!(chunks.iter().any(|c| c.symbol_name.as_deref() == Some("jobs")));
    }
}
