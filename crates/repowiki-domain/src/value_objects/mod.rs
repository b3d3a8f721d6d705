//! Strong-typed identifiers shared across the domain.

mod ids;

pub use ids::{ChunkId, JobId, RepositoryId, WikiPageId, WikiSectionId};
