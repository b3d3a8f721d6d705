//! Port traits: the capability contracts infrastructure and provider crates
//! implement, and the application layer depends on only as trait objects.

pub mod cancellation;
pub mod embedding;
pub mod file_state_store;
pub mod git;
pub mod job_queue;
pub mod job_state;
pub mod llm;
pub mod parser;
pub mod progress_bus;
pub mod repo_index_store;
pub mod repo_repository;
pub mod task_repository;
pub mod vector_store;
pub mod wiki_repository;

pub use cancellation::CancellationRegistry;
pub use embedding::EmbeddingProvider;
pub use file_state_store::FileStateStore;
pub use git::{DiffEntry, DiffKind, GitClient};
pub use job_queue::JobQueue;
pub use job_state::JobStateMachine;
pub use llm::{ChatMessage, ChatRole, CompletionRequest, LlmProvider};
pub use parser::{FileParser, ParseInput, ParserRegistry};
pub use progress_bus::{topic_for, ProgressBus};
pub use repo_index_store::RepoIndexStore;
pub use repo_repository::RepoRepository;
pub use task_repository::TaskRepository;
pub use vector_store::{VectorMatch, VectorPoint, VectorStoreProvider};
pub use wiki_repository::WikiRepository;
