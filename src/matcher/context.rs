use crate::catalogue::Catalogue;
use crate::embeddings::EmbeddingProvider;
use crate::index::{record_id, IndexRecord, RecordMetadata, VectorIndex};
use crate::models::CatalogueEntry;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::Arc;

/// Descriptions embedded per provider call during population
const EMBED_BATCH_SIZE: usize = 32;

/// How a warm index reacts to a catalogue it was not built from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Keep serving the old vectors and log a warning
    #[default]
    Keep,
    /// Drop the index and embed the current catalogue again
    Rebuild,
}

impl StalePolicy {
    pub fn from_flag(rebuild_on_catalogue_change: bool) -> Self {
        if rebuild_on_catalogue_change {
            StalePolicy::Rebuild
        } else {
            StalePolicy::Keep
        }
    }
}

/// Everything a lookup needs, built once at startup and owned by the finder
///
/// The embedding index is populated only when it is empty. After that the
/// vectors are reused as-is on every run.
pub struct FinderContext {
    catalogue: Catalogue,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl FinderContext {
    /// Wrap already-prepared parts without touching the index
    pub fn new(
        catalogue: Catalogue,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            catalogue,
            embedder,
            index,
        }
    }

    /// Cold start: populate the index if it is empty, then hand back a ready context
    pub async fn initialize(
        catalogue: Catalogue,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        policy: StalePolicy,
    ) -> Result<Self> {
        Self::initialize_with_progress(catalogue, embedder, index, policy, &ProgressBar::hidden()).await
    }

    pub async fn initialize_with_progress(
        catalogue: Catalogue,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        policy: StalePolicy,
        progress: &ProgressBar,
    ) -> Result<Self> {
        let context = Self::new(catalogue, embedder, index);
        let fingerprint = context.catalogue.fingerprint();
        let count = context.index.count().await.context("Failed to read embedding index")?;

        if count == 0 {
            context.populate(&fingerprint, progress).await?;
            return Ok(context);
        }

        let stored = context.index.fingerprint().await?;
        if stored.as_deref() == Some(fingerprint.as_str()) {
            tracing::debug!(records = count, "Embedding index is up to date");
            return Ok(context);
        }

        match policy {
            StalePolicy::Keep => {
                tracing::warn!(
                    records = count,
                    catalogue = context.catalogue.len(),
                    "Embedding index was built from a different catalogue; keeping existing vectors"
                );
            }
            StalePolicy::Rebuild => {
                tracing::info!(
                    records = count,
                    catalogue = context.catalogue.len(),
                    "Catalogue changed, rebuilding embedding index"
                );
                context.index.reset().await.context("Failed to reset embedding index")?;
                context.populate(&fingerprint, progress).await?;
            }
        }

        Ok(context)
    }

    async fn populate(&self, fingerprint: &str, progress: &ProgressBar) -> Result<()> {
        let described: Vec<&CatalogueEntry> =
            self.catalogue.iter().filter(|e| e.has_description()).collect();
        progress.set_length(described.len() as u64);

        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; self.catalogue.len()];
        for batch in described.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|e| e.description.clone()).collect();
            let embeddings = self
                .embedder
                .compute_embeddings(&texts)
                .await
                .context("Failed to embed catalogue descriptions")?;
            for (entry, embedding) in batch.iter().zip(embeddings) {
                vectors[entry.index] = Some(embedding);
            }
            progress.inc(batch.len() as u64);
        }

        // entries without a description still get a slot so every ordinal resolves
        let dimension = vectors
            .iter()
            .flatten()
            .map(Vec::len)
            .next()
            .unwrap_or_else(|| self.embedder.dimension());

        let records: Vec<IndexRecord> = self
            .catalogue
            .iter()
            .zip(vectors)
            .map(|(entry, embedding)| IndexRecord {
                id: record_id(entry.index),
                embedding: embedding.unwrap_or_else(|| vec![0.0; dimension]),
                document: entry.description.clone(),
                metadata: RecordMetadata {
                    filename: entry.filename.clone(),
                },
            })
            .collect();

        let added = records.len();
        self.index.add(records).await.context("Failed to store embeddings")?;
        self.index.set_fingerprint(fingerprint).await?;
        progress.finish_and_clear();

        tracing::info!(memes = added, "Added memes to embedding index");
        Ok(())
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }
}
