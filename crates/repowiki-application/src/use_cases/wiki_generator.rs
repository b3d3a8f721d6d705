//! Wiki Generator: full outline-driven generation and incremental
//! dirty-page regeneration (§4.5).

use std::sync::Arc;

use regex::Regex;
use repowiki_domain::constants::{SECTION_RETITLE_THRESHOLD, WIKI_DIRTY_THRESHOLD, WIKI_PAGE_CONCURRENCY};
use repowiki_domain::entities::{
    Chunk, PageImportance, RepoIndex, WellKnownPageType, Wiki, WikiPage, WikiSection,
};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::{ChatMessage, ChatRole, CompletionRequest, LlmProvider};
use repowiki_domain::value_objects::{RepositoryId, WikiPageId, WikiSectionId};
use tokio::sync::Semaphore;

use crate::services::outline_parser::{parse_outline, OutlinePage, OutlineSection};

/// Outcome of an incremental regeneration attempt.
pub enum IncrementalOutcome {
    /// The updated wiki, plus the count of dirty pages that exhausted the
    /// degradation ladder and were left out rather than aborting the patch.
    Patched(Wiki, usize),
    FullRegenSuggested { reason: String },
}

pub struct WikiGenerator {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl WikiGenerator {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { llm, model }
    }

    /// Build the repo summary fed to the outline prompt: top files by chunk
    /// count, a directory tree sketch, per-file symbol catalog, a language
    /// histogram, and the README head (if any chunk carries it).
    fn build_repo_summary(chunks: &[Chunk], repo_index: &RepoIndex) -> String {
        use std::collections::HashMap;

        let mut chunk_counts: HashMap<&str, usize> = HashMap::new();
        let mut lang_counts: HashMap<&str, usize> = HashMap::new();
        for chunk in chunks {
            *chunk_counts.entry(chunk.file_path.as_str()).or_insert(0) += 1;
            *lang_counts.entry(chunk.language.as_str()).or_insert(0) += 1;
        }

        let mut top_files: Vec<(&str, usize)> = chunk_counts.into_iter().collect();
        top_files.sort_by(|a, b| b.1.cmp(&a.1));
        top_files.truncate(20);

        let readme_head = chunks
            .iter()
            .find(|c| c.file_path.to_ascii_lowercase().starts_with("readme"))
            .map(|c| c.content.chars().take(500).collect::<String>())
            .unwrap_or_default();

        let mut summary = String::new();
        summary.push_str("## Top files by chunk count\n");
        for (path, count) in &top_files {
            summary.push_str(&format!("- {path} ({count} chunks)\n"));
        }
        summary.push_str("\n## Language histogram\n");
        for (lang, count) in &lang_counts {
            summary.push_str(&format!("- {lang}: {count}\n"));
        }
        summary.push_str("\n## Symbol catalog\n");
        for (path, symbols) in repo_index.files.iter().take(50) {
            summary.push_str(&format!(
                "- {path}: functions={:?} classes={:?}\n",
                symbols.functions, symbols.classes
            ));
        }
        if !readme_head.is_empty() {
            summary.push_str("\n## README (head)\n");
            summary.push_str(&readme_head);
        }
        summary
    }

    /// Full generation: outline → quick-start + per-section pages. Returns
    /// the wiki plus the count of pages that exhausted the degradation
    /// ladder and were dropped rather than aborting the whole run.
    pub async fn generate_full(
        &self,
        repo_id: RepositoryId,
        repo_title: &str,
        chunks: &[Chunk],
        repo_index: &RepoIndex,
    ) -> Result<(Wiki, usize)> {
        let summary = Self::build_repo_summary(chunks, repo_index);
        let outline_prompt = format!(
            "Produce a documentation outline for this repository as XML wrapped in \
             <wiki_structure>. Each <section title=\"...\"> contains <page title=\"...\" \
             importance=\"high|medium|low\"><files><file>path</file>...</files></page>.\n\n{summary}"
        );

        let outline_response = self
            .llm
            .generate(CompletionRequest {
                messages: vec![ChatMessage {
                    role: ChatRole::User,
                    content: outline_prompt,
                }],
                model: self.model.clone(),
                temperature: 0.2,
                max_tokens: None,
            })
            .await?;

        let outline = parse_outline(&outline_response);

        let semaphore = Arc::new(Semaphore::new(WIKI_PAGE_CONCURRENCY));
        let mut sections = Vec::with_capacity(outline.len() + 1);
        let mut summaries = Vec::new();
        let mut skipped = 0usize;

        for (section_idx, outline_section) in outline.iter().enumerate() {
            let mut pages = Vec::with_capacity(outline_section.pages.len());
            let mut handles = Vec::new();

            for page in &outline_section.pages {
                let permit = Arc::clone(&semaphore);
                let page = page.clone();
                let content = find_relevant_content(chunks, &page.relevant_files);
                let section_id = WikiSectionId::new();
                let llm = Arc::clone(&self.llm);
                let model = self.model.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = permit.acquire_owned().await.expect("semaphore not closed");
                    generate_page_body(llm.as_ref(), &model, &page, &content, section_id).await
                }));
            }

            for handle in handles {
                let outcome = handle
                    .await
                    .map_err(|e| Error::internal(format!("page generation task panicked: {e}")))??;
                match outcome {
                    Some(page) => {
                        summaries.push((page.title.clone(), page.summary.clone().unwrap_or_default()));
                        pages.push(page);
                    }
                    None => skipped += 1,
                }
            }

            sections.push(WikiSection {
                id: WikiSectionId::new(),
                title: outline_section.title.clone(),
                order_index: (section_idx + 1) as u32,
                pages,
            });
        }

        let quick_start = self.build_quick_start(&summaries).await?;

        let mut all_sections = vec![quick_start];
        all_sections.extend(sections);

        Ok((
            Wiki {
                repo_id,
                title: repo_title.to_owned(),
                sections: all_sections,
            },
            skipped,
        ))
    }

    /// Build the system-generated quick-start section (overview + navigation)
    /// from the collected per-page summaries. Never produced by the outline
    /// LLM step.
    async fn build_quick_start(&self, summaries: &[(String, String)]) -> Result<WikiSection> {
        let section_id = WikiSectionId::new();
        let nav_body = summaries
            .iter()
            .map(|(title, summary)| format!("- **{title}**: {summary}"))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(WikiSection {
            id: section_id,
            title: "Quick Start".to_owned(),
            order_index: 0,
            pages: vec![
                WikiPage {
                    id: WikiPageId::new(),
                    section_id,
                    title: "Overview".to_owned(),
                    importance: PageImportance::High,
                    body_markdown: format!(
                        "# Overview\n\nThis wiki documents {} generated pages.",
                        summaries.len()
                    ),
                    relevant_files: Vec::new(),
                    summary: None,
                    page_type: Some(WellKnownPageType::Overview),
                    order_index: 0,
                },
                WikiPage {
                    id: WikiPageId::new(),
                    section_id,
                    title: "Content Navigation".to_owned(),
                    importance: PageImportance::High,
                    body_markdown: format!("# Content Navigation\n\n{nav_body}"),
                    relevant_files: Vec::new(),
                    summary: None,
                    page_type: Some(WellKnownPageType::Navigation),
                    order_index: 1,
                },
            ],
        })
    }

    /// Incremental regeneration: regenerate only dirty pages, or refuse with
    /// `full_regen_suggested` if the dirty ratio exceeds the threshold.
    pub async fn generate_incremental(
        &self,
        existing: Wiki,
        changed_paths: &[String],
        chunks: &[Chunk],
    ) -> Result<IncrementalOutcome> {
        let dirty_ratio = existing.dirty_ratio(changed_paths);
        if dirty_ratio > WIKI_DIRTY_THRESHOLD {
            return Ok(IncrementalOutcome::FullRegenSuggested {
                reason: format!(
                    "{:.0}% of pages intersect the change set, above the {:.0}% threshold",
                    dirty_ratio * 100.0,
                    WIKI_DIRTY_THRESHOLD * 100.0
                ),
            });
        }

        let semaphore = Arc::new(Semaphore::new(WIKI_PAGE_CONCURRENCY));
        let mut sections = Vec::with_capacity(existing.sections.len());
        let mut summaries = Vec::new();
        let mut skipped = 0usize;

        for section in existing.sections {
            if section.is_quick_start() {
                continue;
            }

            let section_dirty_ratio = section.dirty_ratio(changed_paths);
            let mut title = section.title.clone();
            if section_dirty_ratio >= SECTION_RETITLE_THRESHOLD {
                title = self.maybe_retitle(&title, &section).await?;
            }

            let mut pages = Vec::with_capacity(section.pages.len());
            let mut handles = Vec::new();
            for page in section.pages {
                if !page.is_dirty(changed_paths) {
                    summaries.push((page.title.clone(), page.summary.clone().unwrap_or_default()));
                    pages.push(page);
                    continue;
                }
                let permit = Arc::clone(&semaphore);
                let outline_page = OutlinePage {
                    title: page.title.clone(),
                    importance: page.importance,
                    relevant_files: page.relevant_files.clone(),
                };
                let content = find_relevant_content(chunks, &outline_page.relevant_files);
                let llm = Arc::clone(&self.llm);
                let model = self.model.clone();
                let section_id = page.section_id;
                handles.push(tokio::spawn(async move {
                    let _permit = permit.acquire_owned().await.expect("semaphore not closed");
                    generate_page_body(llm.as_ref(), &model, &outline_page, &content, section_id).await
                }));
            }

            for handle in handles {
                let outcome = handle
                    .await
                    .map_err(|e| Error::internal(format!("page generation task panicked: {e}")))??;
                match outcome {
                    Some(page) => {
                        summaries.push((page.title.clone(), page.summary.clone().unwrap_or_default()));
                        pages.push(page);
                    }
                    None => skipped += 1,
                }
            }

            sections.push(WikiSection {
                id: section.id,
                title,
                order_index: section.order_index,
                pages,
            });
        }

        // The quick-start section is always regenerated last, from the final
        // (post-patch) set of page summaries, even when none of its own
        // pages were individually dirty.
        let quick_start = self.build_quick_start(&summaries).await?;
        let mut all_sections = vec![quick_start];
        all_sections.extend(sections);

        Ok(IncrementalOutcome::Patched(
            Wiki {
                repo_id: existing.repo_id,
                title: existing.title,
                sections: all_sections,
            },
            skipped,
        ))
    }

    async fn maybe_retitle(&self, current_title: &str, section: &WikiSection) -> Result<String> {
        let prompt = format!(
            "The section \"{current_title}\" had most of its pages rewritten. Current page \
             titles: {:?}. Reply with an improved section title only, or the same title if no \
             change is warranted.",
            section.pages.iter().map(|p| p.title.clone()).collect::<Vec<_>>()
        );
        let response = self
            .llm
            .generate(CompletionRequest {
                messages: vec![ChatMessage {
                    role: ChatRole::User,
                    content: prompt,
                }],
                model: self.model.clone(),
                temperature: 0.2,
                max_tokens: Some(64),
            })
            .await?;
        let trimmed = response.trim();
        Ok(if trimmed.is_empty() {
            current_title.to_owned()
        } else {
            trimmed.to_owned()
        })
    }
}

fn find_relevant_content(chunks: &[Chunk], relevant_files: &[String]) -> String {
    chunks
        .iter()
        .filter(|c| relevant_files.contains(&c.file_path))
        .map(|c| format!("### {}\n```{}\n{}\n```", c.file_path, c.language, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Progressively truncate retrieved code context on token-budget failure:
/// 50% of chars, then 25%, then metadata-only (file paths, no code).
fn degrade_context(content: &str, attempt: usize, relevant_files: &[String]) -> String {
    match attempt {
        0 => content.to_owned(),
        1 => content.chars().take(content.chars().count() / 2).collect(),
        2 => content.chars().take(content.chars().count() / 4).collect(),
        _ => relevant_files
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Generate one technical page via the Planner/Diagram/Writer sub-agent
/// trio, falling back to a single monolithic call if either D or W fails,
/// and degrading the retrieved context if that also hits a token-budget
/// error. `Ok(None)` means every attempt failed and the page should be
/// recorded as skipped rather than aborting the whole wiki generation run.
async fn generate_page_body(
    llm: &dyn LlmProvider,
    model: &str,
    page: &OutlinePage,
    content: &str,
    section_id: WikiSectionId,
) -> Result<Option<WikiPage>> {
    let mut body = None;
    for attempt in 0..4 {
        let degraded = degrade_context(content, attempt, &page.relevant_files);
        match try_cooperative_generation(llm, model, page, &degraded).await {
            Ok(markdown) => {
                body = Some(markdown);
                break;
            }
            Err(Error::TokenBudget { .. }) if attempt < 3 => continue,
            Err(_) => break,
        }
    }

    let Some(markdown) = body else {
        return Ok(None);
    };

    let summary_prompt = format!(
        "Summarize the following documentation page in 2-3 sentences:\n\n{markdown}"
    );
    let summary = llm
        .generate(CompletionRequest {
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: summary_prompt,
            }],
            model: model.to_owned(),
            temperature: 0.2,
            max_tokens: Some(200),
        })
        .await
        .ok();

    Ok(Some(WikiPage {
        id: WikiPageId::new(),
        section_id,
        title: page.title.clone(),
        importance: page.importance,
        body_markdown: markdown,
        relevant_files: page.relevant_files.clone(),
        summary,
        page_type: None,
        order_index: 0,
    }))
}

/// The Planner/Diagram/Writer trio; falls back to one monolithic call if
/// either the diagram or writer agent fails.
async fn try_cooperative_generation(
    llm: &dyn LlmProvider,
    model: &str,
    page: &OutlinePage,
    content: &str,
) -> Result<String> {
    let plan_prompt = format!(
        "Plan subsections and at most 2 diagrams for a page titled \"{}\". Reply as JSON: \
         {{\"subsections\": [...], \"diagrams\": [...]}}.\n\n{content}",
        page.title
    );
    let plan = llm
        .generate(CompletionRequest {
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: plan_prompt,
            }],
            model: model.to_owned(),
            temperature: 0.2,
            max_tokens: None,
        })
        .await;

    let Ok(plan) = plan else {
        return monolithic_generation(llm, model, page, content).await;
    };

    let diagram_prompt = format!("Produce diagram specs for this plan:\n\n{plan}");
    let diagrams = llm
        .generate(CompletionRequest {
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: diagram_prompt,
            }],
            model: model.to_owned(),
            temperature: 0.2,
            max_tokens: None,
        })
        .await;

    let Ok(diagrams) = diagrams else {
        return monolithic_generation(llm, model, page, content).await;
    };

    let writer_prompt = format!(
        "Write the Markdown body for page \"{}\" using this plan:\n{plan}\n\nUse \
         [DIAGRAM_N] placeholders where diagrams belong.\n\n{content}",
        page.title
    );
    let writer_response = llm
        .generate(CompletionRequest {
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: writer_prompt,
            }],
            model: model.to_owned(),
            temperature: 0.3,
            max_tokens: None,
        })
        .await;

    match writer_response {
        Ok(markdown) => Ok(substitute_diagrams(&markdown, &diagrams)),
        Err(_) => monolithic_generation(llm, model, page, content).await,
    }
}

async fn monolithic_generation(
    llm: &dyn LlmProvider,
    model: &str,
    page: &OutlinePage,
    content: &str,
) -> Result<String> {
    let prompt = format!(
        "Write a complete Markdown documentation page titled \"{}\".\n\n{content}",
        page.title
    );
    llm.generate(CompletionRequest {
        messages: vec![ChatMessage {
            role: ChatRole::User,
            content: prompt,
        }],
        model: model.to_owned(),
        temperature: 0.3,
        max_tokens: None,
    })
    .await
}

/// Replace `[DIAGRAM_N]` placeholders with the corresponding block from the
/// diagram agent's response; strip any placeholder left unreferenced.
fn substitute_diagrams(markdown: &str, diagrams: &str) -> String {
    let Ok(placeholder_re) = Regex::new(r"\[DIAGRAM_(\d+)\]") else {
        return markdown.to_owned();
    };
    let blocks: Vec<&str> = diagrams.split("---").map(str::trim).collect();

    placeholder_re
        .replace_all(markdown, |caps: &regex::Captures<'_>| {
            let idx: usize = caps[1].parse().unwrap_or(0);
            blocks.get(idx).map_or_else(String::new, |b| format!("\n\n{b}\n\n"))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrade_ladder_halves_then_quarters() {
        let content = "a".repeat(100);
        assert_eq!(degrade_context(&content, 0, &[]).len(), 100);
        assert_eq!(degrade_context(&content, 1, &[]).len(), 50);
        assert_eq!(degrade_context(&content, 2, &[]).len(), 25);
    }

    #[test]
    fn metadata_only_fallback_lists_files() {
        let out = degrade_context("ignored", 3, &["a.rs".to_owned(), "b.rs".to_owned()]);
        assert!(out.contains("a.rs"));
        assert!(out.contains("b.rs"));
    }

    #[test]
    fn substitute_diagrams_strips_unreferenced_placeholder() {
        let markdown = "Body [DIAGRAM_0] more text [DIAGRAM_5]";
        let out = substitute_diagrams(markdown, "graph TD; A-->B;");
        assert!(out.contains("graph TD"));
        assert!(!out.contains("[DIAGRAM_5]"));
    }
}
