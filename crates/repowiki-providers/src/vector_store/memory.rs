//! In-process cosine-similarity [`VectorStoreProvider`]. Suitable for tests
//! and small single-node deployments where standing up Qdrant is overkill.

use async_trait::async_trait;
use dashmap::DashMap;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::vector_store::{VectorMatch, VectorPoint, VectorStoreProvider};
use serde_json::Value;

struct Collection {
    dimensions: usize,
    points: DashMap<String, VectorPoint>,
}

/// Stores every collection's points in memory, scoring queries by cosine
/// similarity on every call. No persistence: state is lost on restart.
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: DashMap<String, Collection>,
}

impl MemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn matches_filter(payload: &Value, filter: &Value) -> bool {
    let Some(filter_obj) = filter.as_object() else {
        return true;
    };
    let Some(payload_obj) = payload.as_object() else {
        return false;
    };
    filter_obj.iter().all(|(k, v)| payload_obj.get(k) == Some(v))
}

#[async_trait]
impl VectorStoreProvider for MemoryVectorStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.collections.entry(name.to_owned()).or_insert_with(|| Collection {
            dimensions,
            points: DashMap::new(),
        });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.remove(name);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.iter().map(|e| e.key().clone()).collect())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::vector_store(format!("collection {collection} does not exist")))?;
        for point in points {
            if point.vector.len() != entry.dimensions {
                return Err(Error::vector_store(format!(
                    "point {} has {} dimensions, collection expects {}",
                    point.id,
                    point.vector.len(),
                    entry.dimensions
                )));
            }
            entry.points.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn delete_points(&self, collection: &str, ids: &[String]) -> Result<()> {
        if let Some(entry) = self.collections.get(collection) {
            for id in ids {
                entry.points.remove(id);
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<Value>,
    ) -> Result<Vec<VectorMatch>> {
        let Some(entry) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut scored: Vec<VectorMatch> = entry
            .points
            .iter()
            .filter(|p| filter.as_ref().is_none_or(|f| matches_filter(&p.payload, f)))
            .map(|p| VectorMatch {
                id: p.id.clone(),
                score: cosine_similarity(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn get_points(&self, collection: &str, ids: &[String]) -> Result<Vec<VectorMatch>> {
        let Some(entry) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| entry.points.get(id))
            .map(|p| VectorMatch {
                id: p.id.clone(),
                score: 1.0,
                payload: p.payload.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn point(id: &str, vector: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.to_owned(),
            vector,
            payload: json!({"kind": "function"}),
        }
    }

    #[tokio::test]
    async fn query_ranks_by_cosine_similarity() {
        let store = MemoryVectorStore::new();
        store.ensure_collection("repo-1", 2).await.unwrap();
        store
            .upsert(
                "repo-1",
                vec![point("a", vec![1.0, 0.0]), point("b", vec![0.0, 1.0])],
            )
            .await
            .unwrap();

        let matches = store.query("repo-1", &[1.0, 0.0], 1, None).await.unwrap();
        assert_eq!(matches[0].id, "a");
    }

    #[tokio::test]
    async fn upsert_rejects_dimension_mismatch() {
        let store = MemoryVectorStore::new();
        store.ensure_collection("repo-1", 2).await.unwrap();
        let result = store.upsert("repo-1", vec![point("a", vec![1.0, 0.0, 0.0])]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_collection_drops_its_points() {
        let store = MemoryVectorStore::new();
        store.ensure_collection("repo-1", 2).await.unwrap();
        store.upsert("repo-1", vec![point("a", vec![1.0, 0.0])]).await.unwrap();
        store.delete_collection("repo-1").await.unwrap();
        assert!(store.query("repo-1", &[1.0, 0.0], 1, None).await.unwrap().is_empty());
    }
}
