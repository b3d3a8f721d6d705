//! Generate stage: delegates to the Wiki Generator. Reports progress within
//! the 75-95% sub-range; `wiki_regenerate` tasks short-circuit directly here.

use std::sync::Arc;

use repowiki_domain::entities::{Chunk, RepoIndex, Stage};
use repowiki_domain::error::Result;
use repowiki_domain::ports::WikiRepository;
use repowiki_domain::value_objects::RepositoryId;

use super::StageContext;
use crate::use_cases::wiki_generator::{IncrementalOutcome, WikiGenerator};

pub struct GenerateOutput {
    pub wiki_id: Option<String>,
    pub wiki_regen_suggestion: Option<String>,
    pub skipped_pages: usize,
}

pub struct GenerateStage {
    generator: Arc<WikiGenerator>,
    wiki_repository: Arc<dyn WikiRepository>,
}

impl GenerateStage {
    #[must_use]
    pub fn new(generator: Arc<WikiGenerator>, wiki_repository: Arc<dyn WikiRepository>) -> Self {
        Self {
            generator,
            wiki_repository,
        }
    }

    pub async fn run_full(
        &self,
        ctx: &StageContext,
        repo_id: RepositoryId,
        repo_title: &str,
        chunks: &[Chunk],
        repo_index: &RepoIndex,
    ) -> Result<GenerateOutput> {
        ctx.report(Stage::Generate, 75.0, "Generating wiki").await?;

        let (wiki, skipped_pages) = self
            .generator
            .generate_full(repo_id, repo_title, chunks, repo_index)
            .await?;

        self.wiki_repository.replace(&wiki).await?;

        ctx.report(Stage::Generate, 95.0, "Wiki generated").await?;

        Ok(GenerateOutput {
            wiki_id: Some(repo_id.to_string()),
            wiki_regen_suggestion: None,
            skipped_pages,
        })
    }

    pub async fn run_incremental(
        &self,
        ctx: &StageContext,
        repo_id: RepositoryId,
        changed_paths: &[String],
        chunks: &[Chunk],
    ) -> Result<GenerateOutput> {
        ctx.report(Stage::Generate, 75.0, "Updating wiki").await?;

        let Some(existing) = self.wiki_repository.get(&repo_id).await? else {
            // No prior wiki to patch; treat as a signal for the caller to
            // fall back to full generation.
            return Ok(GenerateOutput {
                wiki_id: None,
                wiki_regen_suggestion: Some("no existing wiki to patch incrementally".to_owned()),
                skipped_pages: 0,
            });
        };

        match self
            .generator
            .generate_incremental(existing, changed_paths, chunks)
            .await?
        {
            IncrementalOutcome::Patched(wiki, skipped_pages) => {
                self.wiki_repository.replace(&wiki).await?;
                ctx.report(Stage::Generate, 95.0, "Wiki patched").await?;
                Ok(GenerateOutput {
                    wiki_id: Some(repo_id.to_string()),
                    wiki_regen_suggestion: None,
                    skipped_pages,
                })
            }
            IncrementalOutcome::FullRegenSuggested { reason } => {
                ctx.report(Stage::Generate, 95.0, "Incremental regeneration declined").await?;
                Ok(GenerateOutput {
                    wiki_id: Some(repo_id.to_string()),
                    wiki_regen_suggestion: Some(reason),
                    skipped_pages: 0,
                })
            }
        }
    }
}
