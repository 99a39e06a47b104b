use crate::index::{IndexHit, IndexRecord, VectorIndex};
use crate::utils;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const DISTANCE_SPACE: &str = "cosine";

/// On-disk layout of one collection
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Collection {
    name: String,
    space: String,
    #[serde(default)]
    fingerprint: Option<String>,
    #[serde(default)]
    records: Vec<IndexRecord>,
}

impl Collection {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            space: DISTANCE_SPACE.to_string(),
            fingerprint: None,
            records: Vec::new(),
        }
    }
}

/// Exact nearest-neighbour index persisted as a JSON file per collection
///
/// Every write is flushed to `<dir>/<collection>.json` through a temp file and
/// a rename, so a crash mid-write leaves the previous state readable.
pub struct LocalVectorIndex {
    path: PathBuf,
    collection: RwLock<Collection>,
}

impl LocalVectorIndex {
    /// Open (or create) the named collection under `dir`
    pub async fn open<P: AsRef<Path>>(dir: P, collection: &str) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create index directory: {}", dir.display()))?;

        let path = dir.join(format!("{}.json", collection));
        let state = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read index file: {}", path.display()))?;
            let state: Collection = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse index file: {}", path.display()))?;
            if state.space != DISTANCE_SPACE {
                anyhow::bail!(
                    "Index {} uses '{}' distance, expected '{}'",
                    path.display(),
                    state.space,
                    DISTANCE_SPACE
                );
            }
            tracing::debug!(path = %path.display(), records = state.records.len(), "Opened embedding index");
            state
        } else {
            Collection::empty(collection)
        };

        Ok(Self {
            path,
            collection: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &Collection) -> Result<()> {
        let bytes = serde_json::to_vec(state).context("Failed to serialize embedding index")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write index file: {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace index file: {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn count(&self) -> Result<usize> {
        Ok(self.collection.read().await.records.len())
    }

    async fn add(&self, records: Vec<IndexRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut state = self.collection.write().await;

        let dimension = state
            .records
            .first()
            .or_else(|| records.first())
            .map(|r| r.embedding.len())
            .unwrap_or_default();
        let mut seen: HashSet<&str> = state.records.iter().map(|r| r.id.as_str()).collect();
        for record in &records {
            if record.embedding.len() != dimension {
                anyhow::bail!(
                    "Record {} has dimension {}, index expects {}",
                    record.id,
                    record.embedding.len(),
                    dimension
                );
            }
            if !seen.insert(record.id.as_str()) {
                anyhow::bail!("Duplicate record id: {}", record.id);
            }
        }

        let mut next = state.clone();
        next.records.extend(records);
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    async fn query(&self, embedding: &[f32], n_results: usize) -> Result<Vec<IndexHit>> {
        let state = self.collection.read().await;
        if n_results == 0 || state.records.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(first) = state.records.first() {
            if first.embedding.len() != embedding.len() {
                anyhow::bail!(
                    "Query embedding has dimension {}, index holds dimension {}",
                    embedding.len(),
                    first.embedding.len()
                );
            }
        }

        let mut scored: Vec<(usize, f32)> = state
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| (pos, utils::cosine_distance(embedding, &record.embedding)))
            .collect();
        // stable sort keeps insertion order among equal distances
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(n_results)
            .map(|(pos, distance)| {
                let record = &state.records[pos];
                IndexHit {
                    id: record.id.clone(),
                    distance,
                    document: record.document.clone(),
                    metadata: record.metadata.clone(),
                }
            })
            .collect())
    }

    async fn fingerprint(&self) -> Result<Option<String>> {
        Ok(self.collection.read().await.fingerprint.clone())
    }

    async fn set_fingerprint(&self, fingerprint: &str) -> Result<()> {
        let mut state = self.collection.write().await;
        let mut next = state.clone();
        next.fingerprint = Some(fingerprint.to_string());
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.collection.write().await;
        let next = Collection::empty(&state.name);
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }
}
