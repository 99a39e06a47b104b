use anyhow::{Context, Result};

/// Trait for embedding providers that can compute semantic vectors from text
///
/// The same provider must be used to build the index and to embed queries,
/// otherwise distances are meaningless.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute embedding vector from text content
    async fn compute_embedding(&self, content: &str) -> Result<Vec<f32>>;

    /// Get the dimension of embeddings produced by this provider
    fn dimension(&self) -> usize;

    /// Embed several texts in order, one request at a time
    ///
    /// Providers with a batch endpoint can override this.
    async fn compute_embeddings(&self, contents: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(contents.len());
        for (i, content) in contents.iter().enumerate() {
            let embedding = self
                .compute_embedding(content)
                .await
                .with_context(|| format!("Failed to compute embedding {}/{}", i + 1, contents.len()))?;
            embeddings.push(embedding);
        }
        Ok(embeddings)
    }
}
