//! The Vector Store port — collection lifecycle and point CRUD against
//! whatever embedding backend is configured.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A single embedded point. `id` is a string so both UUIDs and
/// backend-native integer ids can be represented uniformly.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// A scored match returned from [`VectorStoreProvider::query`].
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub payload: Value,
}

#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create the collection if it does not already exist, sized for
    /// `dimensions`. Idempotent.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Drop a collection entirely (used on repository deletion).
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// List all collection names currently present in the backend, used by
    /// the orphan reconciler to find collections no live repo owns.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Insert or replace points by id.
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()>;

    /// Delete points by id. Never errors if some ids are already absent.
    async fn delete_points(&self, collection: &str, ids: &[String]) -> Result<()>;

    /// Nearest-neighbour search, optionally narrowed by a payload filter
    /// (backend-specific JSON shape).
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<Value>,
    ) -> Result<Vec<VectorMatch>>;

    /// Fetch points by id without scoring, used by the wiki generator to
    /// re-hydrate cited chunks.
    async fn get_points(&self, collection: &str, ids: &[String]) -> Result<Vec<VectorMatch>>;
}
