pub mod r#trait;
pub mod local;
pub mod tei;

pub use local::LocalEmbeddingProvider;
pub use tei::TeiEmbeddingProvider;
pub use r#trait::EmbeddingProvider;

use crate::config::Config;
use std::sync::Arc;

/// Build the embedding provider selected in the configuration
pub fn from_config(config: &Config) -> Arc<dyn EmbeddingProvider> {
    match config.embedding_provider.as_str() {
        "ollama" => Arc::new(
            LocalEmbeddingProvider::new(
                Some(config.ollama.url.as_str()),
                Some(config.ollama.model.as_str()),
                Some(config.ollama.dims),
            )
            .with_timeout(config.ollama.timeout_secs),
        ),
        other => {
            if other != "tei" {
                tracing::warn!(provider = other, "Unknown embedding provider, falling back to TEI");
            }
            Arc::new(
                TeiEmbeddingProvider::new(Some(config.tei.url.as_str()), Some(config.tei.dims))
                    .with_timeout(config.tei.timeout_secs),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults_to_tei() {
        let config = Config::default();
        let provider = from_config(&config);
        assert_eq!(provider.dimension(), 384);
    }

    #[test]
    fn test_from_config_ollama() {
        let mut config = Config::default();
        config.embedding_provider = "ollama".to_string();
        config.ollama.dims = 1024;
        let provider = from_config(&config);
        assert_eq!(provider.dimension(), 1024);
    }
}
