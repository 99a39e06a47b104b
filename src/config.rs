use crate::utils;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration loaded from settings.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalogue: CatalogueConfig,
    #[serde(default)]
    pub index: IndexConfig,
    /// "tei" or "ollama"
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,
    #[serde(default)]
    pub tei: TeiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub hosted: HostedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    pub path: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            path: "data/meme_database.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub dir: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Re-embed the catalogue when it no longer matches the stored fingerprint
    #[serde(default)]
    pub rebuild_on_catalogue_change: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: "data/index".to_string(),
            collection: default_collection(),
            rebuild_on_catalogue_change: false,
        }
    }
}

fn default_collection() -> String {
    "memes".to_string()
}

fn default_embedding_provider() -> String {
    "tei".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeiConfig {
    pub url: String,
    #[serde(default = "default_tei_dims")]
    pub dims: usize,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_tei_dims() -> usize {
    384 // all-MiniLM-L6-v2
}

impl Default for TeiConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            dims: default_tei_dims(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    #[serde(default = "default_embedding_dims")]
    pub dims: usize,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_embedding_dims() -> usize {
    384 // all-minilm
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:11434".to_string(),
            model: "all-minilm".to_string(),
            dims: default_embedding_dims(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Pick memes with the chat model instead of nearest-neighbour search
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    10
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://router.huggingface.co/v1".to_string(),
            model: "Qwen/Qwen2.5-72B-Instruct".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedConfig {
    /// Hugging Face space in "owner/name" form
    pub space: String,
    /// Overrides the URL derived from `space`
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            space: "atlasia/moul_lmemes".to_string(),
            base_url: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from default location or return defaults
    pub fn load() -> Result<Self> {
        let default_paths = [
            "config/settings.toml",
            "./config/settings.toml",
            "~/.config/memefinder/settings.toml",
        ];

        for raw in default_paths {
            let path = utils::expand_path(raw);
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    pub fn catalogue_path(&self) -> PathBuf {
        utils::expand_path(&self.catalogue.path)
    }

    pub fn index_dir(&self) -> PathBuf {
        utils::expand_path(&self.index.dir)
    }

    /// Get the LLM API token from config or the HF_TOKEN environment variable
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("HF_TOKEN").ok().filter(|key| !key.is_empty()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalogue: CatalogueConfig::default(),
            index: IndexConfig::default(),
            embedding_provider: default_embedding_provider(),
            tei: TeiConfig::default(),
            ollama: OllamaConfig::default(),
            llm: LlmConfig::default(),
            hosted: HostedConfig::default(),
        }
    }
}
