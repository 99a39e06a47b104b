pub mod context;
pub mod llm;
pub mod similarity;

pub use context::{FinderContext, StalePolicy};
pub use llm::{LlmMatcher, LlmSettings};
pub use similarity::SimilarityMatcher;

use crate::catalogue::Catalogue;
use crate::config::Config;
use crate::error::MatchError;
use crate::index::LocalVectorIndex;
use crate::models::{MatchResult, MemeMatch};
use crate::{embeddings, llm as providers};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::Arc;

/// Strategy chosen when the finder is built
pub enum MatchMode {
    Similarity(SimilarityMatcher),
    Llm(LlmMatcher),
}

/// Single entry point for callers: text in, best meme out
pub struct MemeFinder {
    context: FinderContext,
    mode: MatchMode,
}

impl MemeFinder {
    pub fn new(context: FinderContext, mode: MatchMode) -> Self {
        Self { context, mode }
    }

    /// Finder using nearest-neighbour search only
    pub fn with_similarity(context: FinderContext) -> Self {
        Self::new(context, MatchMode::Similarity(SimilarityMatcher::new()))
    }

    /// Finder that lets a chat model choose
    pub fn with_llm(context: FinderContext, matcher: LlmMatcher) -> Self {
        Self::new(context, MatchMode::Llm(matcher))
    }

    /// Load the catalogue, open (and if needed populate) the index, and pick
    /// the strategy, all from configuration
    pub async fn from_config(config: &Config, progress: &ProgressBar) -> Result<Self> {
        let catalogue_path = config.catalogue_path();
        let catalogue = Catalogue::load(&catalogue_path).await?;
        tracing::info!(path = %catalogue_path.display(), memes = catalogue.len(), "Loaded meme catalogue");

        let index = LocalVectorIndex::open(config.index_dir(), &config.index.collection)
            .await
            .context("Failed to open embedding index")?;
        let context = FinderContext::initialize_with_progress(
            catalogue,
            embeddings::from_config(config),
            Arc::new(index),
            StalePolicy::from_flag(config.index.rebuild_on_catalogue_change),
            progress,
        )
        .await?;

        if !config.llm.enabled {
            return Ok(Self::with_similarity(context));
        }

        let settings = LlmSettings {
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
        };
        let provider = Arc::new(providers::from_config(config));
        Ok(Self::with_llm(context, LlmMatcher::new(provider, settings)))
    }

    pub fn uses_llm(&self) -> bool {
        matches!(self.mode, MatchMode::Llm(_))
    }

    pub fn context(&self) -> &FinderContext {
        &self.context
    }

    /// Find the most relevant meme for `text`
    ///
    /// `top_k` bounds how many neighbours the similarity path requests; the
    /// LLM path ignores it.
    pub async fn find_relevant_meme(&self, text: &str, top_k: usize) -> Result<MemeMatch, MatchError> {
        match &self.mode {
            MatchMode::Similarity(matcher) => matcher.find(&self.context, text, top_k).await,
            MatchMode::Llm(matcher) => matcher.find(&self.context, text).await,
        }
    }

    /// Same lookup, flattened into the shape handed to agents
    pub async fn find_relevant_meme_result(&self, text: &str, top_k: usize) -> MatchResult {
        MatchResult::from(self.find_relevant_meme(text, top_k).await)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::embeddings::EmbeddingProvider;
    use crate::llm::{ChatRequest, LlmProvider};
    use anyhow::Result;
    use std::sync::Mutex;

    /// Word-list embedder: one axis per concept, words vote for their axis
    pub struct ConceptEmbedder;

    const CONCEPTS: &[&[&str]] = &[
        &["cat", "kitten", "falling", "table", "fell"],
        &["dog", "pet", "running", "circles", "chasing", "tail", "puppy"],
        &["tired", "sleep", "exhausted", "monday"],
    ];

    #[async_trait::async_trait]
    impl EmbeddingProvider for ConceptEmbedder {
        async fn compute_embedding(&self, content: &str) -> Result<Vec<f32>> {
            if content.trim().is_empty() {
                anyhow::bail!("Cannot generate embedding for empty content");
            }
            let mut vector = vec![0.0; CONCEPTS.len() + 1];
            for word in content.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
                for (axis, words) in CONCEPTS.iter().enumerate() {
                    if words.contains(&word) {
                        vector[axis] += 1.0;
                    }
                }
            }
            // small shared component so unrelated text is not a zero vector
            vector[CONCEPTS.len()] = 0.1;
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            CONCEPTS.len() + 1
        }
    }

    /// Chat provider replaying a canned reply and recording requests
    pub struct ScriptedLlm {
        reply: Result<String, String>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedLlm {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: &str) -> Self {
            Self {
                reply: Err(error.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().map(|r| r.len()).unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            self.reply.clone().map_err(anyhow::Error::msg)
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}
