use crate::error::MatchError;
use serde::{Deserialize, Serialize};

/// One row of the meme catalogue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogueEntry {
    /// Zero-based row position, stable for the lifetime of the process
    pub index: usize,
    /// Image filename as listed in the catalogue
    pub filename: String,
    /// Free-text description (empty when the catalogue has none)
    pub description: String,
}

impl CatalogueEntry {
    pub fn new(index: usize, filename: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            index,
            filename: filename.into(),
            description: description.into(),
        }
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// A meme picked for a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemeMatch {
    pub filename: String,
    pub description: String,
    /// Cosine distance on the similarity path, cosine similarity when the LLM picked
    pub similarity_score: f32,
    pub llm_selected: bool,
}

/// Flat result shape handed to the calling agent
///
/// Exactly one of the match fields or `error` is set. A missing `filename` is
/// the only failure signal callers need to check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MatchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub llm_selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        self.filename.is_some()
    }
}

impl From<Result<MemeMatch, MatchError>> for MatchResult {
    fn from(outcome: Result<MemeMatch, MatchError>) -> Self {
        match outcome {
            Ok(meme) => Self {
                filename: Some(meme.filename),
                description: Some(meme.description),
                similarity_score: Some(meme.similarity_score),
                llm_selected: meme.llm_selected,
                error: None,
            },
            Err(err) => Self {
                error: Some(err.to_string()),
                ..Self::default()
            },
        }
    }
}
