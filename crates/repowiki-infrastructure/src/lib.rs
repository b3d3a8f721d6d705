//! Infrastructure layer: concrete adapters for every domain port — SQLite for
//! relational state, Redis for cancellation/progress/queueing, plus
//! configuration loading, logging, and credential scrubbing.

pub mod cancellation_registry;
pub mod config;
pub mod db;
pub mod file_state_store;
pub mod job_state_machine;
pub mod logging;
pub mod progress_bus;
pub mod queue;
pub mod repo_index_store;
pub mod repo_repository;
pub mod scrubber;
pub mod task_repository;
pub mod wiki_repository;

pub use cancellation_registry::RedisCancellationRegistry;
pub use config::AppConfig;
pub use file_state_store::SqliteFileStateStore;
pub use job_state_machine::SqliteJobStateMachine;
pub use progress_bus::RedisProgressBus;
pub use queue::RedisJobQueue;
pub use repo_index_store::SqliteRepoIndexStore;
pub use repo_repository::SqliteRepoRepository;
pub use task_repository::SqliteTaskRepository;
pub use wiki_repository::SqliteWikiRepository;
