//! Markdown [`FileParser`] — splits a document into `document_section`
//! chunks at heading boundaries via `pulldown-cmark`.

use async_trait::async_trait;
use pulldown_cmark::{Event, HeadingLevel, Parser as CmarkParser, Tag, TagEnd};
use repowiki_domain::entities::Chunk;
use repowiki_domain::error::Result;
use repowiki_domain::ports::parser::{FileParser, ParseInput};
use repowiki_domain::value_objects::ChunkId;

pub struct MarkdownParser;

impl MarkdownParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

struct Section {
    heading: Option<String>,
    body: String,
    start_line: usize,
}

#[async_trait]
impl FileParser for MarkdownParser {
    fn languages(&self) -> &[&str] {
        &["markdown"]
    }

    async fn parse(&self, input: ParseInput<'_>) -> Result<Vec<Chunk>> {
        let sections = split_sections(input.content);
        let total_lines = input.content.lines().count().max(1);

        let chunks = sections
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.body.trim().is_empty())
            .map(|(idx, section)| {
                let end_line = sections
                    .get(idx + 1)
                    .map(|next| next.start_line.saturating_sub(1))
                    .unwrap_or(total_lines)
                    .max(section.start_line);
                Chunk {
                    id: ChunkId::new(),
                    repo_id: input.repo_id,
                    file_path: input.file_path.to_owned(),
                    node_type: "document_section".to_owned(),
                    symbol_name: section.heading.clone(),
                    start_line: section.start_line,
                    end_line,
                    content: section.body.trim().to_owned(),
                    language: "markdown".to_owned(),
                    parent_chunk_id: None,
                    called_symbols: Vec::new(),
                    docstring: None,
                    metadata: None,
                }
            })
            .collect();
        Ok(chunks)
    }
}

/// Walks the event stream, starting a new section at every ATX/setext
/// heading and accumulating everything up to the next heading as its body.
fn split_sections(content: &str) -> Vec<Section> {
    let mut sections = vec![Section {
        heading: None,
        body: String::new(),
        start_line: 1,
    }];
    let mut in_heading = false;
    let mut heading_text = String::new();

    let parser = CmarkParser::new(content).into_offset_iter();
    for (event, range) in parser {
        let line = content[..range.start].lines().count().max(1);
        match event {
            Event::Start(Tag::Heading { level, .. }) if level <= HeadingLevel::H3 => {
                in_heading = true;
                heading_text.clear();
            }
            Event::End(TagEnd::Heading(level)) if level <= HeadingLevel::H3 => {
                in_heading = false;
                sections.push(Section {
                    heading: Some(heading_text.trim().to_owned()),
                    body: String::new(),
                    start_line: line,
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if in_heading {
                    heading_text.push_str(&text);
                } else if let Some(last) = sections.last_mut() {
                    last.body.push_str(&text);
                    last.body.push('\n');
                }
            }
            _ => {}
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use repowiki_domain::value_objects::RepositoryId;

    use super::*;

    #[tokio::test]
    async fn splits_on_headings() {
        let parser = MarkdownParser::new();
        let source = "# Title\n\nIntro text.\n\n## Usage\n\nHow to use it.\n";
        let input = ParseInput {
            repo_id: RepositoryId::new(),
            file_path: "README.md",
            content: source,
            language: "markdown",
        };
        let chunks = parser.parse(input).await.unwrap();
        assert!(chunks.iter().any(|c| c.symbol_name.as_deref() == Some("Title")));
        assert!(chunks.iter().any(|c| c.symbol_name.as_deref() == Some("Usage")));
    }
}
