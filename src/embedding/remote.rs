//! Remote embedding provider for OpenAI-compatible `/embeddings` endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use super::{Embedding, EmbeddingProvider};
use crate::providers::ai::{LlmError, LlmResult};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

/// Embedding provider that calls a remote API.
///
/// Requires a credential. Failures are logged and reported as an empty
/// embedding so ranking can fall back to lexical scoring.
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl RemoteEmbeddingProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the embedding model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn request(&self, text: &str) -> LlmResult<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationError(format!("HTTP {}", status.as_u16())),
                429 => LlmError::RateLimited {
                    retry_after_secs: None,
                },
                code => LlmError::ApiError {
                    status: code,
                    message: format!("HTTP {}", code),
                },
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parse_embedding_response(json)?
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No embeddings in response".to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn embed(&self, text: &str) -> Embedding {
        match self.request(text).await {
            Ok(values) => Embedding::new(values),
            Err(e) => {
                tracing::warn!(error = %e, model = %self.model, "Remote embedding failed");
                Embedding::empty()
            }
        }
    }
}

/// Parses an OpenAI-style embedding response, ordering items by `index`.
fn parse_embedding_response(json: Value) -> LlmResult<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| LlmError::InvalidResponse("Embedding response is missing data array".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| LlmError::InvalidResponse("Embedding item missing embedding array".into()))?;

        let mut values = Vec::with_capacity(embedding.len());
        for value in embedding {
            let number = value
                .as_f64()
                .ok_or_else(|| LlmError::InvalidResponse("Embedding value must be numeric".into()))?;
            values.push(number as f32);
        }
        indexed.push((index, values));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, values)| values).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embeddings_in_index_order() {
        let json = serde_json::json!({
            "data": [
                { "index": 1, "embedding": [2.0, 3.0] },
                { "index": 0, "embedding": [0.5, 1.5] }
            ]
        });
        let parsed = parse_embedding_response(json).unwrap();
        assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
    }

    #[test]
    fn rejects_missing_data() {
        let err = parse_embedding_response(serde_json::json!({ "object": "list" })).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn rejects_non_numeric_values() {
        let json = serde_json::json!({ "data": [{ "embedding": ["x"] }] });
        assert!(parse_embedding_response(json).is_err());
    }

    #[test]
    fn request_body_shape() {
        let body = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: ["hello"],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "model": "text-embedding-3-small", "input": ["hello"] })
        );
    }

    #[test]
    fn trailing_slash_removed() {
        let provider = RemoteEmbeddingProvider::new("http://localhost:8080/v1/", "key", "m");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
        assert_eq!(provider.model(), "m");
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_empty() {
        let provider = RemoteEmbeddingProvider::new("http://127.0.0.1:9", "key", "m");
        assert!(provider.embed("hello").await.is_empty());
    }
}
