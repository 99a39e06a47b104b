use crate::catalogue::Catalogue;
use crate::error::{MatchError, Upstream};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::matcher::FinderContext;
use crate::models::{CatalogueEntry, MemeMatch};
use crate::utils;
use anyhow::{Context, Result};
use std::sync::Arc;

const NO_DESCRIPTION: &str = "No description available";

/// Sampling settings for the selection request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LlmSettings {
    /// The model is expected to answer with a bare number
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            max_tokens: 10,
            temperature: 0.1,
        }
    }
}

/// Lets a chat model read the whole catalogue and name the best entry by number
pub struct LlmMatcher {
    provider: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl LlmMatcher {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> LlmSettings {
        self.settings
    }

    pub async fn find(&self, context: &FinderContext, query: &str) -> Result<MemeMatch, MatchError> {
        let catalogue = context.catalogue();
        if catalogue.is_empty() {
            return Err(MatchError::NoMatch);
        }

        let request = self.build_request(catalogue, query);
        tracing::debug!(model = self.provider.model(), memes = catalogue.len(), "Sending selection prompt");

        let reply = self.provider.complete(&request).await.map_err(|e| {
            tracing::error!(error = %format!("{:#}", e), "LLM request failed");
            MatchError::upstream(Upstream::Llm, &e)
        })?;
        tracing::debug!(reply = %reply, "LLM reply");

        let entry = select_entry(catalogue, &reply)?;
        tracing::debug!(filename = %entry.filename, "LLM selected meme");

        let similarity = diagnostic_similarity(context, query, entry).await.map_err(|e| {
            tracing::error!(error = %format!("{:#}", e), "Failed to score LLM selection");
            MatchError::upstream(Upstream::Llm, &e)
        })?;

        Ok(MemeMatch {
            filename: entry.filename.clone(),
            description: entry.description.clone(),
            similarity_score: similarity,
            llm_selected: true,
        })
    }

    fn build_request(&self, catalogue: &Catalogue, query: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::system(system_prompt(catalogue.len())),
                ChatMessage::user(user_prompt(catalogue, query)),
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }
}

/// Instruction declaring the valid answers 1..=total, with 0 for "none fit"
pub fn system_prompt(total: usize) -> String {
    format!(
        "You are a meme expert. Your task is to find the most relevant meme for the given text.\n\
         Consider both the filename and description when making your selection.\n\
         Respond with ONLY the number of the meme (1-{total}).\n\
         If none are relevant, respond with \"0\".\n\
         \n\
         For example, if the text is \"I'm tired\" and there's a meme about being exhausted, that would be relevant.\n"
    )
}

/// The query followed by the numbered catalogue
pub fn user_prompt(catalogue: &Catalogue, query: &str) -> String {
    let mut memes = String::from("Available memes:\n");
    for entry in catalogue {
        let description = if entry.has_description() {
            entry.description.as_str()
        } else {
            NO_DESCRIPTION
        };
        memes.push_str(&format!("{}. {}: {}\n", entry.index + 1, entry.filename, description));
    }
    format!("Text: \"{}\"\n\n{}", query, memes)
}

/// Last run of ASCII digits in the reply
///
/// Models sometimes reason before answering, so later numbers win. Runs too
/// large for `u64` come back as `u64::MAX`, which no catalogue can satisfy.
pub fn last_number(reply: &str) -> Option<u64> {
    let bytes = reply.as_bytes();
    let mut end = bytes.len();
    while end > 0 && !bytes[end - 1].is_ascii_digit() {
        end -= 1;
    }
    if end == 0 {
        return None;
    }
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    Some(reply[start..end].parse().unwrap_or(u64::MAX))
}

/// Map the model's 1-based answer onto the catalogue
pub fn select_entry<'a>(catalogue: &'a Catalogue, reply: &str) -> Result<&'a CatalogueEntry, MatchError> {
    let Some(answer) = last_number(reply) else {
        tracing::debug!("No number found in LLM reply");
        return Err(MatchError::NoMatch);
    };

    let entry = usize::try_from(answer)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| catalogue.get(i));

    match entry {
        Some(entry) => Ok(entry),
        None => {
            tracing::debug!(answer, valid = catalogue.len(), "LLM answer outside catalogue range");
            Err(MatchError::NoMatch)
        }
    }
}

/// Cosine similarity between query and chosen description, for reporting only
///
/// Blank text on either side scores 0.0 without calling the embedder.
async fn diagnostic_similarity(context: &FinderContext, query: &str, entry: &CatalogueEntry) -> Result<f32> {
    if query.trim().is_empty() || !entry.has_description() {
        return Ok(0.0);
    }
    let embedder = context.embedder();
    let query_embedding = embedder
        .compute_embedding(query)
        .await
        .context("Failed to embed query")?;
    let meme_embedding = embedder
        .compute_embedding(&entry.description)
        .await
        .context("Failed to embed meme description")?;
    Ok(utils::cosine_similarity(&query_embedding, &meme_embedding))
}
