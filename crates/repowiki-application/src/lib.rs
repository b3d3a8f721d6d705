//! Application layer: use cases that orchestrate domain ports into the
//! ingestion and wiki-generation pipeline. No concrete Git, HTTP, SQL, or
//! vector-store dependency lives here — only `Arc<dyn Trait>` handles.

pub mod services;
pub mod use_cases;
