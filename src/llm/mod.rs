pub mod hf;
pub mod r#trait;

pub use hf::HfInferenceProvider;
pub use r#trait::{ChatMessage, ChatRequest, LlmProvider, Role};

use crate::config::Config;

/// Build the chat provider described by the `[llm]` section
///
/// A missing token is not fatal: the request is sent anonymously and the
/// remote side decides whether to serve it.
pub fn from_config(config: &Config) -> HfInferenceProvider {
    let api_key = config.llm_api_key();
    if api_key.is_none() {
        tracing::warn!("No Hugging Face token provided. Some API calls may be rate-limited.");
    }

    HfInferenceProvider::new(&config.llm.base_url, &config.llm.model, api_key)
        .with_timeout(config.llm.timeout_secs)
}
