//! HTTP [`VectorStoreProvider`] for Qdrant.

use async_trait::async_trait;
use repowiki_domain::error::{Error, Result, TransientKind};
use repowiki_domain::ports::vector_store::{VectorMatch, VectorPoint, VectorStoreProvider};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct QdrantVectorStore {
    base_url: String,
    client: Client,
}

impl QdrantVectorStore {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{collection}", self.base_url)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        return Err(Error::transient(TransientKind::Connection, format!("HTTP {status}: {body}")));
    }
    Err(Error::vector_store(format!("HTTP {status}: {body}")))
}

fn connection_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::transient(TransientKind::Timeout, e.to_string())
    } else {
        Error::transient(TransientKind::Connection, e.to_string())
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantVectorStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let existing = self
            .client
            .get(self.collection_url(name))
            .send()
            .await
            .map_err(connection_error)?;
        if existing.status().is_success() {
            return Ok(());
        }

        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimensions,
                distance: "Cosine",
            },
        };
        let response = self
            .client
            .put(self.collection_url(name))
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.collection_url(name))
            .send()
            .await
            .map_err(connection_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/collections", self.base_url))
            .send()
            .await
            .map_err(connection_error)?;
        let response = check_status(response).await?;
        let parsed: ListCollectionsResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_store(format!("failed to parse collections list: {e}")))?;
        Ok(parsed.result.collections.into_iter().map(|c| c.name).collect())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let body = UpsertRequest {
            points: points
                .into_iter()
                .map(|p| QdrantPoint {
                    id: p.id,
                    vector: p.vector,
                    payload: p.payload,
                })
                .collect(),
        };
        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url(collection)))
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_points(&self, collection: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let body = DeletePointsRequest { points: ids.to_vec() };
        let response = self
            .client
            .post(format!("{}/points/delete?wait=true", self.collection_url(collection)))
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<Value>,
    ) -> Result<Vec<VectorMatch>> {
        let body = SearchRequest {
            vector: vector.to_vec(),
            limit,
            filter,
            with_payload: true,
        };
        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url(collection)))
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        let response = check_status(response).await?;
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_store(format!("failed to parse search response: {e}")))?;
        Ok(parsed
            .result
            .into_iter()
            .map(|r| VectorMatch {
                id: r.id,
                score: r.score,
                payload: r.payload.unwrap_or(Value::Null),
            })
            .collect())
    }

    async fn get_points(&self, collection: &str, ids: &[String]) -> Result<Vec<VectorMatch>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body = RetrieveRequest {
            ids: ids.to_vec(),
            with_payload: true,
        };
        let response = self
            .client
            .post(format!("{}/points", self.collection_url(collection)))
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        let response = check_status(response).await?;
        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_store(format!("failed to parse retrieve response: {e}")))?;
        Ok(parsed
            .result
            .into_iter()
            .map(|r| VectorMatch {
                id: r.id,
                score: 1.0,
                payload: r.payload.unwrap_or(Value::Null),
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<QdrantPoint>,
}

#[derive(Debug, Serialize)]
struct QdrantPoint {
    id: String,
    vector: Vec<f32>,
    payload: Value,
}

#[derive(Debug, Serialize)]
struct DeletePointsRequest {
    points: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPointWire>,
}

#[derive(Debug, Deserialize)]
struct ScoredPointWire {
    id: String,
    score: f32,
    payload: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RetrieveRequest {
    ids: Vec<String>,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    result: Vec<RetrievedPointWire>,
}

#[derive(Debug, Deserialize)]
struct RetrievedPointWire {
    id: String,
    payload: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ListCollectionsResponse {
    result: CollectionsList,
}

#[derive(Debug, Deserialize)]
struct CollectionsList {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_url_strips_trailing_slash() {
        let store = QdrantVectorStore::new("http://localhost:6333/".to_owned());
        assert_eq!(store.collection_url("repo-1"), "http://localhost:6333/collections/repo-1");
    }
}
