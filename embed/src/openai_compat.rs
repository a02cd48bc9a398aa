use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EmbedConfig;
use crate::embed::Embedder;
use crate::error::EmbedError;

/// Known-good embedding models for OpenAI-compatible endpoints.
pub const MODEL_OPENAI_3_SMALL: &str = "text-embedding-3-small";
pub const MODEL_OPENAI_3_LARGE: &str = "text-embedding-3-large";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = MODEL_OPENAI_3_SMALL;
const DEFAULT_DIM: usize = 1536;
const MAX_BATCH: usize = 2048;

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// Works with OpenAI itself or any compatible provider via
/// `EmbedConfig::with_base_url`. Returned vectors are re-normalized
/// locally so downstream cosine similarity reduces to a dot product.
#[derive(Debug)]
pub struct OpenAiCompat {
    client: Client,
    api_key: String,
    model: String,
    dim: usize,
    base_url: String,
}

impl OpenAiCompat {
    pub fn new(api_key: &str) -> Result<Self, EmbedError> {
        Self::with_config(api_key, EmbedConfig::default())
    }

    pub fn with_config(api_key: &str, cfg: EmbedConfig) -> Result<Self, EmbedError> {
        if api_key.trim().is_empty() {
            return Err(EmbedError::ModelUnavailable("missing API key".into()));
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: if cfg.model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                cfg.model
            },
            dim: if cfg.dimension == 0 {
                DEFAULT_DIM
            } else {
                cfg.dimension
            },
            base_url: if cfg.base_url.is_empty() {
                DEFAULT_BASE_URL.to_string()
            } else {
                cfg.base_url
            },
        })
    }

    async fn call_api(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        // Compatible endpoints reject the empty string; substitute a single
        // space so empty input still maps to one deterministic vector.
        let safe: Vec<&str> = texts
            .iter()
            .map(|t| if t.trim().is_empty() { " " } else { *t })
            .collect();

        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: &safe,
            dimensions: self.dim,
            encoding_format: "float",
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbedError::Api(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Api(format!("HTTP {status}: {body}")));
        }

        let data: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::Api(e.to_string()))?;

        // Fill results by index (the API may return out of order).
        let mut vecs: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for item in data.data {
            if item.index >= texts.len() {
                return Err(EmbedError::UnexpectedIndex {
                    index: item.index,
                    batch_size: texts.len(),
                });
            }
            let mut v: Vec<f32> = item.embedding.iter().map(|&x| x as f32).collect();
            crate::hash::l2_normalize(&mut v);
            vecs[item.index] = Some(v);
        }

        vecs.into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or(EmbedError::MissingIndex(i)))
            .collect()
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiCompat {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let vecs = self.embed_batch(&[text]).await?;
        Ok(vecs.into_iter().next().unwrap())
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut result = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            let vecs = self.call_api(chunk).await?;
            result.extend(vecs);
        }
        Ok(result)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// OpenAI-compatible embedding request body.
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
    encoding_format: &'a str,
}

/// OpenAI-compatible embedding response.
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_model_unavailable() {
        let err = OpenAiCompat::new("").unwrap_err();
        assert!(matches!(err, EmbedError::ModelUnavailable(_)));
        let err = OpenAiCompat::new("   ").unwrap_err();
        assert!(matches!(err, EmbedError::ModelUnavailable(_)));
    }

    #[test]
    fn test_config_defaults() {
        let e = OpenAiCompat::new("key").unwrap();
        assert_eq!(e.dimension(), DEFAULT_DIM);
        assert_eq!(e.model, DEFAULT_MODEL);
        assert_eq!(e.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_overrides() {
        let cfg = EmbedConfig::default()
            .with_model("custom-embed")
            .with_dimension(384)
            .with_base_url("http://localhost:9000/v1");
        let e = OpenAiCompat::with_config("key", cfg).unwrap();
        assert_eq!(e.dimension(), 384);
        assert_eq!(e.model, "custom-embed");
        assert_eq!(e.base_url, "http://localhost:9000/v1");
    }
}
