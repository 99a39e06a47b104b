use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Metadata stored with every vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMetadata {
    pub filename: String,
}

/// A vector plus the document it was computed from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRecord {
    /// `meme_<ordinal>`
    pub id: String,
    pub embedding: Vec<f32>,
    /// The raw description the embedding was computed from
    pub document: String,
    pub metadata: RecordMetadata,
}

/// A nearest-neighbour result
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub id: String,
    /// Cosine distance to the query (0.0 is identical direction)
    pub distance: f32,
    pub document: String,
    pub metadata: RecordMetadata,
}

/// Trait for persistent vector stores keyed by cosine distance
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Number of stored vectors
    async fn count(&self) -> Result<usize>;

    /// Append records; ids are expected to be unique
    async fn add(&self, records: Vec<IndexRecord>) -> Result<()>;

    /// The `n_results` closest records, nearest first
    async fn query(&self, embedding: &[f32], n_results: usize) -> Result<Vec<IndexHit>>;

    /// Fingerprint of the catalogue the index was built from, if recorded
    async fn fingerprint(&self) -> Result<Option<String>>;

    async fn set_fingerprint(&self, fingerprint: &str) -> Result<()>;

    /// Drop every record and the stored fingerprint
    async fn reset(&self) -> Result<()>;
}
