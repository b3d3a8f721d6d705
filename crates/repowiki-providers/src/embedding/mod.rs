//! HTTP [`EmbeddingProvider`] speaking the OpenAI-compatible `/embeddings`
//! wire format.

use async_trait::async_trait;
use repowiki_domain::constants::{EMBED_BATCH_MAX, LLM_CALL_TIMEOUT};
use repowiki_domain::error::{Error, Result, TransientKind};
use repowiki_domain::ports::embedding::EmbeddingProvider;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub struct HttpEmbeddingProvider {
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    client: Client,
}

impl HttpEmbeddingProvider {
    #[must_use]
    pub fn new(base_url: String, api_key: String, model: String, dimensions: usize) -> Self {
        let client = Client::builder()
            .timeout(LLM_CALL_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            model,
            dimensions,
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.len() > EMBED_BATCH_MAX {
            return Err(Error::embedding(format!(
                "batch of {} texts exceeds the {EMBED_BATCH_MAX} maximum",
                texts.len()
            )));
        }

        let body = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_error_response(status, text));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("failed to parse embedding response: {e}")))?;
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn connection_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::transient(TransientKind::Timeout, e.to_string())
    } else {
        Error::transient(TransientKind::Connection, e.to_string())
    }
}

fn classify_error_response(status: StatusCode, body: String) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Error::transient(TransientKind::RateLimit, body);
    }
    if status.is_server_error() {
        return Error::transient(TransientKind::Connection, format!("HTTP {status}: {body}"));
    }
    Error::embedding(format!("HTTP {status}: {body}"))
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_batches_over_the_max() {
        let provider = HttpEmbeddingProvider::new(
            "https://api.openai.com/v1".to_owned(),
            "key".to_owned(),
            "text-embedding-3-small".to_owned(),
            1536,
        );
        let texts = vec!["x".to_owned(); EMBED_BATCH_MAX + 1];
        let result = futures::executor::block_on(provider.embed(&texts));
        assert!(matches!(result, Err(Error::Embedding { .. })));
    }

    #[test]
    fn dimensions_reports_configured_value() {
        let provider = HttpEmbeddingProvider::new(
            "https://api.openai.com/v1".to_owned(),
            "key".to_owned(),
            "text-embedding-3-small".to_owned(),
            1536,
        );
        assert_eq!(provider.dimensions(), 1536);
    }
}
