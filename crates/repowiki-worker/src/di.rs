//! Composition root: wires every concrete adapter (infrastructure and
//! providers, the two peer adapter crates) into the application use cases.
//! Nothing outside this module knows about `sqlx`, `redis`, `reqwest`, or
//! `tree-sitter` directly.

use std::sync::Arc;

use repowiki_application::use_cases::delete_repo::DeleteRepoService;
use repowiki_application::use_cases::job_runner::JobRunner;
use repowiki_application::use_cases::orphan_reconciler::OrphanReconciler;
use repowiki_application::use_cases::pipeline::Pipeline;
use repowiki_application::use_cases::stages::clone_sync::CloneSyncStage;
use repowiki_application::use_cases::stages::embed::EmbedStage;
use repowiki_application::use_cases::stages::generate::GenerateStage;
use repowiki_application::use_cases::stages::parse::ParseStage;
use repowiki_application::use_cases::task_submission::TaskSubmissionService;
use repowiki_application::use_cases::wiki_generator::WikiGenerator;
use repowiki_domain::error::Result;
use repowiki_domain::ports::{
    CancellationRegistry, EmbeddingProvider, FileStateStore, GitClient, JobQueue, JobStateMachine,
    LlmProvider, ParserRegistry, ProgressBus, RepoIndexStore, RepoRepository, TaskRepository,
    VectorStoreProvider, WikiRepository,
};
use repowiki_infrastructure::config::{AppConfig, VectorBackend};
use repowiki_infrastructure::{
    db, RedisCancellationRegistry, RedisJobQueue, RedisProgressBus, SqliteFileStateStore,
    SqliteJobStateMachine, SqliteRepoIndexStore, SqliteRepoRepository, SqliteTaskRepository,
    SqliteWikiRepository,
};
use repowiki_providers::embedding::HttpEmbeddingProvider;
use repowiki_providers::git::ProcessGitClient;
use repowiki_providers::llm::HttpLlmProvider;
use repowiki_providers::parser::DefaultParserRegistry;
use repowiki_providers::vector_store::{MemoryVectorStore, QdrantVectorStore};

/// Every concrete adapter and use case, held as `Arc` so handlers/loops can
/// clone cheaply. Built once at process start by [`Container::build`].
pub struct Container {
    pub job_state: Arc<dyn JobStateMachine>,
    pub repos: Arc<dyn RepoRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub job_queue: Arc<dyn JobQueue>,
    pub cancellation: Arc<dyn CancellationRegistry>,
    pub progress_bus: Arc<dyn ProgressBus>,
    pub vector_store: Arc<dyn VectorStoreProvider>,
    pub job_runner: Arc<JobRunner>,
    pub task_submission: Arc<TaskSubmissionService>,
    pub orphan_reconciler: Arc<OrphanReconciler>,
    pub delete_repo: Arc<DeleteRepoService>,
}

impl Container {
    /// Connect every backing store and assemble the full use-case graph.
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let pool = db::connect(&config.database_url).await?;

        let repos: Arc<dyn RepoRepository> = Arc::new(SqliteRepoRepository::new(pool.clone()));
        let tasks: Arc<dyn TaskRepository> = Arc::new(SqliteTaskRepository::new(pool.clone()));
        let job_state: Arc<dyn JobStateMachine> = Arc::new(SqliteJobStateMachine::new(pool.clone()));
        let file_states: Arc<dyn FileStateStore> = Arc::new(SqliteFileStateStore::new(pool.clone()));
        let wiki_repository: Arc<dyn WikiRepository> = Arc::new(SqliteWikiRepository::new(pool.clone()));
        let repo_index_store: Arc<dyn RepoIndexStore> = Arc::new(SqliteRepoIndexStore::new(pool));

        let cancellation: Arc<dyn CancellationRegistry> =
            Arc::new(RedisCancellationRegistry::connect(&config.redis_url).await?);
        let progress_bus: Arc<dyn ProgressBus> =
            Arc::new(RedisProgressBus::connect(&config.redis_url).await?);
        let job_queue: Arc<dyn JobQueue> = Arc::new(RedisJobQueue::connect(&config.redis_url).await?);

        let git: Arc<dyn GitClient> = Arc::new(ProcessGitClient::discover()?);
        let parser_registry: Arc<dyn ParserRegistry> = Arc::new(DefaultParserRegistry::new());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingProvider::new(
            config.embedding_endpoint.clone(),
            config.embedding_api_key.clone(),
            config.embedding_model.clone(),
            1536,
        ));
        let llm: Arc<dyn LlmProvider> = Arc::new(HttpLlmProvider::new(
            config.llm_endpoint.clone(),
            config.llm_api_key.clone(),
        ));
        let vector_store: Arc<dyn VectorStoreProvider> = match config.vector_backend {
            VectorBackend::Memory => Arc::new(MemoryVectorStore::new()),
            VectorBackend::Qdrant => Arc::new(QdrantVectorStore::new(config.qdrant_url.clone())),
        };

        let clone_sync = Arc::new(CloneSyncStage::new(
            Arc::clone(&git),
            Arc::clone(&repos),
            Arc::clone(&file_states),
            Arc::clone(&vector_store),
            config.clones_root.clone(),
        ));
        let parse = Arc::new(ParseStage::new(Arc::clone(&file_states), parser_registry));
        let embed = Arc::new(EmbedStage::new(
            embedder,
            Arc::clone(&vector_store),
            Arc::clone(&file_states),
        ));
        let wiki_generator = Arc::new(WikiGenerator::new(llm, config.llm_model.clone()));
        let generate = Arc::new(GenerateStage::new(wiki_generator, wiki_repository));

        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&job_state),
            Arc::clone(&cancellation),
            Arc::clone(&progress_bus),
            Arc::clone(&repos),
            Arc::clone(&repo_index_store),
            clone_sync,
            parse,
            embed,
            generate,
        ));
        let job_runner = Arc::new(JobRunner::new(Arc::clone(&job_state), pipeline));

        let task_submission = Arc::new(TaskSubmissionService::new(
            Arc::clone(&repos),
            Arc::clone(&job_state),
            Arc::clone(&job_queue),
        ));
        let orphan_reconciler = Arc::new(OrphanReconciler::new(
            Arc::clone(&repos),
            Arc::clone(&tasks),
            Arc::clone(&vector_store),
            config.clones_root.clone(),
        ));
        let delete_repo = Arc::new(DeleteRepoService::new(
            Arc::clone(&repos),
            Arc::clone(&job_state),
            Arc::clone(&job_queue),
            Arc::clone(&cancellation),
            Arc::clone(&vector_store),
        ));

        Ok(Self {
            job_state,
            repos,
            tasks,
            job_queue,
            cancellation,
            progress_bus,
            vector_store,
            job_runner,
            task_submission,
            orphan_reconciler,
            delete_repo,
        })
    }
}
