use crate::embeddings::EmbeddingProvider;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Text Embeddings Inference (TEI) provider from Hugging Face
/// Defaults to the 384-dim sentence-transformers/all-MiniLM-L6-v2
pub struct TeiEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
    dimension: AtomicUsize,
}

impl TeiEmbeddingProvider {
    /// Create a new TEI embedding provider
    /// Default URL: http://127.0.0.1:8080
    pub fn new(base_url: Option<&str>, dimension: Option<usize>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or("http://127.0.0.1:8080")
                .trim_end_matches('/')
                .to_string(),
            timeout: None,
            dimension: AtomicUsize::new(dimension.unwrap_or(384)),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout = timeout_secs.map(Duration::from_secs);
        self
    }

    async fn embed_batch(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embed", self.base_url);
        let request = TeiEmbeddingRequest {
            inputs,
            truncate: Some(true),
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.context("Failed to connect to TEI server")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("TEI API returned error {}: {}", status, error_text);
        }

        // TEI answers with one vector per input, in input order
        let embeddings: Vec<Vec<f32>> = response
            .json()
            .await
            .context("Failed to parse TEI embedding response")?;

        if let Some(first) = embeddings.first() {
            if first.is_empty() {
                anyhow::bail!("TEI returned empty embedding (dimension 0)");
            }
            let actual_dimension = first.len();
            let expected_dimension = self.dimension.load(Ordering::Relaxed);
            if actual_dimension != expected_dimension {
                tracing::info!(
                    actual_dimension,
                    expected_dimension,
                    "TEI embedding dimension differs from configuration, updating"
                );
                self.dimension.store(actual_dimension, Ordering::Relaxed);
            }
        }

        Ok(embeddings)
    }
}

#[derive(Serialize)]
struct TeiEmbeddingRequest {
    inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for TeiEmbeddingProvider {
    async fn compute_embedding(&self, content: &str) -> Result<Vec<f32>> {
        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("Cannot generate embedding for empty content");
        }

        self.embed_batch(vec![content.to_string()])
            .await?
            .into_iter()
            .next()
            .context("TEI returned empty embeddings array")
    }

    async fn compute_embeddings(&self, contents: &[String]) -> Result<Vec<Vec<f32>>> {
        if contents.is_empty() {
            return Ok(Vec::new());
        }
        if contents.iter().any(|c| c.trim().is_empty()) {
            anyhow::bail!("Cannot generate embedding for empty content");
        }

        let inputs = contents.iter().map(|c| c.trim().to_string()).collect();
        let embeddings = self.embed_batch(inputs).await?;
        if embeddings.len() != contents.len() {
            anyhow::bail!(
                "TEI returned {} embeddings for {} inputs",
                embeddings.len(),
                contents.len()
            );
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension.load(Ordering::Relaxed)
    }
}
