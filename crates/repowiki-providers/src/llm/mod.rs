//! HTTP [`LlmProvider`] speaking the OpenAI-compatible chat-completions wire
//! format. Works against any endpoint implementing that contract (OpenAI
//! itself, vLLM, Ollama's OpenAI-compatible shim, etc).

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use repowiki_domain::constants::LLM_CALL_TIMEOUT;
use repowiki_domain::error::{Error, Result, TransientKind};
use repowiki_domain::ports::llm::{ChatMessage, ChatRole, CompletionRequest, LlmProvider};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Calls an OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpLlmProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpLlmProvider {
    #[must_use]
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(LLM_CALL_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(request: &CompletionRequest, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    async fn classify_error_response(status: StatusCode, body: String) -> Error {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Error::transient(TransientKind::RateLimit, body);
        }
        if status.is_server_error() {
            return Error::transient(TransientKind::Connection, format!("HTTP {status}: {body}"));
        }
        if status == StatusCode::BAD_REQUEST && body.to_ascii_lowercase().contains("context") {
            return Error::TokenBudget { message: body };
        }
        Error::llm(format!("HTTP {status}: {body}"))
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn generate(&self, request: CompletionRequest) -> Result<String> {
        let body = Self::request_body(&request, false);
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
            return Err(Self::classify_error_response(status, text).await);
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(parse_error)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::llm("chat completion returned no choices".to_owned()))
    }

    async fn stream(&self, request: CompletionRequest) -> Result<BoxStream<'static, Result<String>>> {
        let body = Self::request_body(&request, true);
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
            return Err(Self::classify_error_response(status, text).await);
        }

        let byte_stream = response.bytes_stream();
        let stream = byte_stream
            .map(|chunk| chunk.map_err(connection_error))
            .flat_map(|chunk| futures::stream::iter(parse_sse_chunk(chunk)));

        Ok(Box::pin(stream))
    }
}

fn connection_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::transient(TransientKind::Timeout, e.to_string())
    } else {
        Error::transient(TransientKind::Connection, e.to_string())
    }
}

fn parse_error(e: reqwest::Error) -> Error {
    Error::llm(format!("failed to parse chat completion response: {e}"))
}

/// Splits one `bytes_stream` item into zero or more `data: {...}` SSE events
/// and extracts each event's text delta. `[DONE]` sentinels are dropped.
fn parse_sse_chunk(chunk: Result<bytes::Bytes>) -> Vec<Result<String>> {
    let bytes = match chunk {
        Ok(b) => b,
        Err(e) => return vec![Err(e)],
    };
    let text = String::from_utf8_lossy(&bytes);
    text.lines()
        .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(str::trim)
        .filter(|payload| !payload.is_empty() && *payload != "[DONE]")
        .filter_map(|payload| serde_json::from_str::<ChatCompletionChunk>(payload).ok())
        .filter_map(|chunk| chunk.choices.into_iter().next())
        .filter_map(|choice| choice.delta.content)
        .map(Ok)
        .collect()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        Self {
            role,
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChatCompletionChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunkChoice {
    delta: ChatCompletionDelta,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sse_delta_and_skips_done_sentinel() {
        let chunk = bytes::Bytes::from(
            "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\ndata: [DONE]\n",
        );
        let deltas = parse_sse_chunk(Ok(chunk));
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].as_ref().unwrap(), "hi");
    }

    #[test]
    fn wire_message_maps_roles() {
        let msg = ChatMessage {
            role: ChatRole::System,
            content: "be terse".to_owned(),
        };
        let wire = WireMessage::from(&msg);
        assert_eq!(wire.role, "system");
    }
}
