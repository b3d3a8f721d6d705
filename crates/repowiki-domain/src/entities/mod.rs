//! Core domain entities.

pub mod chunk;
pub mod file_state;
pub mod repo_index;
pub mod repository;
pub mod task;
pub mod wiki;

pub use chunk::Chunk;
pub use file_state::FileState;
pub use repo_index::RepoIndex;
pub use repository::{Repository, RepositoryStatus};
pub use task::{Stage, Task, TaskStatus, TaskType};
pub use wiki::{PageImportance, WellKnownPageType, Wiki, WikiPage, WikiSection};
