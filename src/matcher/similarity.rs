use crate::error::{MatchError, Upstream};
use crate::index::parse_record_id;
use crate::matcher::FinderContext;
use crate::models::MemeMatch;
use anyhow::Context;

/// Picks the catalogue entry whose description embedding is nearest the query
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityMatcher;

impl SimilarityMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Nearest-neighbour lookup; `top_k` neighbours are requested, the first is used
    ///
    /// `similarity_score` carries the index's cosine distance, so lower is closer.
    /// Blank queries carry nothing to compare and never match.
    pub async fn find(
        &self,
        context: &FinderContext,
        query: &str,
        top_k: usize,
    ) -> Result<MemeMatch, MatchError> {
        if query.trim().is_empty() {
            tracing::debug!("Blank query, skipping similarity search");
            return Err(MatchError::NoMatch);
        }

        let query_embedding = context
            .embedder()
            .compute_embedding(query)
            .await
            .context("Failed to embed query")
            .map_err(|e| MatchError::upstream(Upstream::Similarity, &e))?;

        let hits = context
            .index()
            .query(&query_embedding, top_k.max(1))
            .await
            .context("Failed to query embedding index")
            .map_err(|e| MatchError::upstream(Upstream::Similarity, &e))?;

        let Some(hit) = hits.into_iter().next() else {
            return Err(MatchError::NoMatch);
        };

        let Some(entry) = parse_record_id(&hit.id).and_then(|i| context.catalogue().get(i)) else {
            tracing::warn!(id = %hit.id, "Index hit does not map to a catalogue entry");
            return Err(MatchError::NoMatch);
        };

        tracing::debug!(filename = %entry.filename, distance = hit.distance, "Nearest meme");

        Ok(MemeMatch {
            filename: entry.filename.clone(),
            description: entry.description.clone(),
            similarity_score: hit.distance,
            llm_selected: false,
        })
    }
}
