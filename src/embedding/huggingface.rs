//! Hugging Face feature-extraction embeddings.
//!
//! Sentence-transformers models return one pooled vector per input. Plain
//! encoder models return one vector per token, which are mean-pooled here.

use super::Embedder;
use crate::config::ApiCredentials;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Embedder backed by the Hugging Face inference feature-extraction pipeline.
pub struct HuggingFaceEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    dimensions: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtraction {
    Pooled(Vec<Vec<f32>>),
    TokenLevel(Vec<Vec<Vec<f32>>>),
}

impl HuggingFaceEmbedder {
    /// Create an embedder for `model` hosted under the credentials' base URL.
    pub fn new(credentials: &ApiCredentials, model: &str, dimensions: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(crate::openai::DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/pipeline/feature-extraction",
                credentials.api_base.trim_end_matches('/'),
                model
            ),
            api_key: credentials.api_key.clone(),
            dimensions,
        })
    }

    fn mean_pool(tokens: Vec<Vec<f32>>) -> Vec<f32> {
        let count = tokens.len().max(1) as f32;
        let width = tokens.first().map(Vec::len).unwrap_or(0);
        let mut pooled = vec![0.0_f32; width];
        for token in &tokens {
            for (acc, value) in pooled.iter_mut().zip(token) {
                *acc += value;
            }
        }
        pooled.iter_mut().for_each(|v| *v /= count);
        pooled
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SvarError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Requesting feature extraction for {} texts", texts.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": texts }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SvarError::Embedding(format!(
                "Hugging Face API returned {}: {}",
                status, body
            )));
        }

        let embeddings = match response.json::<FeatureExtraction>().await? {
            FeatureExtraction::Pooled(vectors) => vectors,
            FeatureExtraction::TokenLevel(per_text) => {
                per_text.into_iter().map(Self::mean_pool).collect()
            }
        };

        if embeddings.len() != texts.len() {
            return Err(SvarError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
