use std::fmt;
use thiserror::Error;

/// Which matching path an upstream failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// Embedding model or vector index behind the similarity search
    Similarity,
    /// Remote chat model (or the diagnostic embedding computed after it answered)
    Llm,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::Similarity => write!(f, "Error processing similarity search"),
            Upstream::Llm => write!(f, "Error processing LLM response"),
        }
    }
}

/// Reasons a lookup produced no meme
///
/// These are outcomes, not faults of the finder itself: the caller gets them
/// back as data and decides what to show.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Nothing in the catalogue fits (empty catalogue, index miss, or the model
    /// answered 0 / something out of range)
    #[error("No matching memes found")]
    NoMatch,

    /// An embedding, index, or LLM call failed
    #[error("{origin}: {detail}")]
    UpstreamFailure { origin: Upstream, detail: String },
}

impl MatchError {
    pub fn upstream(origin: Upstream, err: &anyhow::Error) -> Self {
        MatchError::UpstreamFailure {
            origin,
            detail: format!("{:#}", err),
        }
    }
}
