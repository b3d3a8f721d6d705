//! Vector-store backends: an in-memory one for tests/small deployments and
//! an HTTP client for Qdrant.

mod memory;
mod qdrant;

pub use memory::MemoryVectorStore;
pub use qdrant::QdrantVectorStore;
