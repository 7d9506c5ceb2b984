use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use recap_core::budget::{CostEstimator, ModelLimitsRegistry, PriceTable, DEFAULT_COST_CEILING, DEFAULT_SURCHARGE};
use serde::{Deserialize, Serialize};

/// Configuration for the summarizer and chat services.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecapConfig {
    pub log_level: String,
    /// Log file prefix; a UTC timestamp is appended per run
    pub logfile: Option<PathBuf>,
    pub base_url: String,
    /// Usually supplied through `OPENAI_API_KEY` rather than the file
    pub api_key: Option<String>,
    pub chat_model: String,
    /// Hard context window of the chat model
    pub model_token_limit: usize,
    /// Operational token budget, below the model limit
    pub max_tokens: usize,
    pub cost_ceiling: u64,
    pub surcharge: f64,
    /// Price per 1000 tokens, overriding the built-in table
    pub prices: HashMap<String, f64>,
    /// User or chat ids allowed to use the service; empty allows everyone
    pub whitelist: Vec<i64>,
    /// Caption languages in order of preference
    pub languages: Vec<String>,
    /// Number of map calls in flight at once
    pub map_concurrency: usize,
    /// Merge multi-chunk video summaries with the renumbering prompt
    pub renumber_points: bool,
    pub cost_annotation: bool,
    pub delivery_chunk_chars: usize,
}

impl Default for RecapConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            logfile: None,
            base_url: "https://api.deepseek.com".to_string(),
            api_key: None,
            chat_model: "deepseek-chat".to_string(),
            model_token_limit: 64_000,
            max_tokens: 50_000,
            cost_ceiling: DEFAULT_COST_CEILING,
            surcharge: DEFAULT_SURCHARGE,
            prices: HashMap::new(),
            whitelist: Vec::new(),
            languages: vec!["ru".to_string(), "en".to_string()],
            map_concurrency: 1,
            renumber_points: false,
            cost_annotation: true,
            delivery_chunk_chars: 3500,
        }
    }
}

impl RecapConfig {
    /// Load from a YAML file, apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the process environment in production).
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.api_key = Some(api_key);
        }
        if let Some(base_url) = lookup("RECAP_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(model) = lookup("RECAP_MODEL").filter(|v| !v.is_empty()) {
            self.chat_model = model;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_tokens == 0 {
            bail!("max_tokens must be greater than zero");
        }
        if self.max_tokens > self.model_token_limit {
            bail!(
                "max_tokens ({}) exceeds model_token_limit ({})",
                self.max_tokens,
                self.model_token_limit
            );
        }
        if let Some(window) = ModelLimitsRegistry::new().context_window(&self.chat_model) {
            if self.model_token_limit > window {
                bail!(
                    "model_token_limit ({}) exceeds the {} token context window of {}",
                    self.model_token_limit,
                    window,
                    self.chat_model
                );
            }
        }
        if self.map_concurrency == 0 {
            bail!("map_concurrency must be at least 1");
        }
        if self.delivery_chunk_chars == 0 {
            bail!("delivery_chunk_chars must be greater than zero");
        }
        if self.languages.is_empty() {
            bail!("at least one caption language is required");
        }
        Ok(())
    }

    pub fn cost_estimator(&self) -> CostEstimator {
        CostEstimator::new(
            PriceTable::with_overrides(self.prices.clone()),
            self.surcharge,
            self.cost_ceiling,
        )
    }
}
