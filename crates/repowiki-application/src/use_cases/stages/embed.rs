//! Embed stage: batch-embed the chunk list, upsert into the vector store,
//! then write FileState rows — strictly in that order (§4.3.3).

use std::collections::HashMap;
use std::sync::Arc;

use repowiki_domain::constants::{
    EMBED_BATCH_MAX, EMBED_CONCURRENCY, RETRY_ATTEMPTS, RETRY_INITIAL_DELAY, RETRY_MAX_DELAY,
};
use repowiki_domain::entities::{Chunk, FileState, Stage};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::{EmbeddingProvider, FileStateStore, VectorPoint, VectorStoreProvider};
use repowiki_domain::value_objects::RepositoryId;
use tokio::sync::Semaphore;

use super::StageContext;

pub struct EmbedOutput {
    pub chunk_count: usize,
}

pub struct EmbedStage {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    file_states: Arc<dyn FileStateStore>,
}

impl EmbedStage {
    #[must_use]
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        file_states: Arc<dyn FileStateStore>,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            file_states,
        }
    }

    pub async fn run(
        &self,
        ctx: &StageContext,
        repo_id: RepositoryId,
        chunks: Vec<Chunk>,
        path_hashes: HashMap<String, String>,
        current_commit: &str,
    ) -> Result<EmbedOutput> {
        ctx.report(Stage::Embed, 50.0, "Embedding chunks").await?;

        if chunks.is_empty() {
            ctx.report(Stage::Embed, 75.0, "Embed complete").await?;
            return Ok(EmbedOutput { chunk_count: 0 });
        }

        let collection = collection_name(repo_id);
        self.vector_store
            .ensure_collection(&collection, self.embedder.dimensions())
            .await?;

        let batches: Vec<Vec<Chunk>> = chunks
            .chunks(EMBED_BATCH_MAX)
            .map(<[Chunk]>::to_vec)
            .collect();
        let semaphore = Arc::new(Semaphore::new(EMBED_CONCURRENCY));
        let total_batches = batches.len();

        let mut all_points = Vec::with_capacity(chunks.len());
        let mut handles = Vec::with_capacity(batches.len());

        for batch in batches {
            let permit = Arc::clone(&semaphore);
            let embedder = Arc::clone(&self.embedder);
            ctx.check_cancelled().await?;
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore not closed");
                embed_batch_with_retry(embedder.as_ref(), &batch).await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let points = handle
                .await
                .map_err(|e| Error::internal(format!("embedding task panicked: {e}")))??;
            all_points.extend(points);

            let pct = 50.0 + 25.0 * ((i + 1) as f32 / total_batches.max(1) as f32);
            ctx.report(Stage::Embed, pct, "Embedding chunks").await?;
        }

        // Vector-store success must precede any FileState write (atomic
        // visibility invariant).
        self.vector_store.upsert(&collection, all_points).await?;

        let chunk_count = chunks
            .iter()
            .filter(|c| path_hashes.contains_key(&c.file_path))
            .count();
        self.persist_file_states(repo_id, current_commit, &path_hashes, &chunks).await?;

        ctx.report(Stage::Embed, 75.0, "Embed complete").await?;

        Ok(EmbedOutput { chunk_count })
    }

    async fn persist_file_states(
        &self,
        repo_id: RepositoryId,
        current_commit: &str,
        path_hashes: &HashMap<String, String>,
        chunks: &[Chunk],
    ) -> Result<()> {
        let mut ids_by_path: HashMap<&str, Vec<repowiki_domain::value_objects::ChunkId>> = HashMap::new();
        for chunk in chunks {
            ids_by_path.entry(&chunk.file_path).or_default().push(chunk.id);
        }

        for (path, hash) in path_hashes {
            let chunk_ids = ids_by_path.get(path.as_str()).cloned().unwrap_or_default();
            let state = FileState {
                repo_id,
                relative_path: path.clone(),
                last_processed_commit: current_commit.to_owned(),
                content_hash: hash.clone(),
                chunk_ids,
            };
            self.file_states.upsert(&state).await?;
        }

        Ok(())
    }
}

fn collection_name(repo_id: RepositoryId) -> String {
    format!("repo_{}_chunks", repo_id.to_string().replace('-', "_"))
}

async fn embed_batch_with_retry(embedder: &dyn EmbeddingProvider, batch: &[Chunk]) -> Result<Vec<VectorPoint>> {
    let inputs: Vec<String> = batch.iter().map(Chunk::embedding_input).collect();
    let mut delay = RETRY_INITIAL_DELAY;

    for attempt in 0..=RETRY_ATTEMPTS {
        match embedder.embed(&inputs).await {
            Ok(vectors) => {
                return Ok(batch
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| VectorPoint {
                        id: chunk.id.to_string(),
                        vector,
                        payload: serde_json::json!({
                            "repo_id": chunk.repo_id.to_string(),
                            "file_path": chunk.file_path,
                            "node_type": chunk.node_type,
                            "symbol_name": chunk.symbol_name,
                            "start_line": chunk.start_line,
                            "end_line": chunk.end_line,
                            "language": chunk.language,
                        }),
                    })
                    .collect());
            }
            Err(e) if e.is_retryable() && attempt < RETRY_ATTEMPTS => {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(RETRY_MAX_DELAY);
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("retry loop always returns or exhausts before this point")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_name_replaces_dashes() {
        let id = RepositoryId::new();
        let name = collection_name(id);
        assert!(name.starts_with("repo_"));
        assert!(!name.contains('-'));
    }
}
