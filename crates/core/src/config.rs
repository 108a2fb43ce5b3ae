use sakina_llm::http::{self, ProviderConfig, ProviderSelection};
use sakina_llm::retry::{self, RetryPolicy};
use std::collections::HashMap;
use std::time::Duration;

/// Startup configuration errors. Never raised per request.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("generation enabled but no credential set (OPENROUTER_API_KEY or HF_TOKEN)")]
    MissingCredential,
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("failed to build provider client: {0}")]
    Client(String),
}

/// Explanation pipeline parameters. Read once at process start.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainCfg {
    pub enabled: bool,

    // primary provider
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub openrouter_url: String,

    // secondary provider
    pub hf_token: String,
    pub hf_model: String,
    pub hf_url: String,

    // network
    pub timeout_secs: f64,
    pub retry_delay_secs: u64,
    pub max_retries: u32,
    pub max_retry_delay_secs: u64,
}

impl Default for ExplainCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            openrouter_api_key: String::new(),
            openrouter_model: http::OPENROUTER_MODEL.to_owned(),
            openrouter_url: http::OPENROUTER_URL.to_owned(),
            hf_token: String::new(),
            hf_model: http::HF_MODEL.to_owned(),
            hf_url: http::hf_model_url(http::HF_MODEL),
            timeout_secs: http::DEFAULT_TIMEOUT.as_secs_f64(),
            retry_delay_secs: 10,
            max_retries: 2,
            max_retry_delay_secs: 60,
        }
    }
}

impl ExplainCfg {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        let map: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&map)
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        let hf_model = get_str(m, "HF_MODEL_NAME").unwrap_or(d.hf_model);
        Self {
            enabled: get_str(m, "ENABLE_LLM_EXPLANATION")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(d.enabled),
            openrouter_api_key: get_str(m, "OPENROUTER_API_KEY").unwrap_or_default(),
            openrouter_model: get_str(m, "OPENROUTER_MODEL").unwrap_or(d.openrouter_model),
            openrouter_url: get_str(m, "OPENROUTER_API_URL").unwrap_or(d.openrouter_url),
            hf_token: get_str(m, "HF_TOKEN").unwrap_or_default(),
            hf_url: get_str(m, "HF_API_URL").unwrap_or_else(|| http::hf_model_url(&hf_model)),
            hf_model,
            timeout_secs: get_or(m, "HF_TIMEOUT_SECONDS", d.timeout_secs),
            retry_delay_secs: get_or(m, "LLM_RETRY_DELAY_SECONDS", d.retry_delay_secs),
            max_retries: get_or(m, "LLM_MAX_RETRIES", d.max_retries),
            max_retry_delay_secs: get_or(m, "LLM_MAX_RETRY_DELAY_SECONDS", d.max_retry_delay_secs),
        }
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.timeout_secs)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or(ConfigError::Invalid {
                key: "HF_TIMEOUT_SECONDS",
                value: self.timeout_secs.to_string(),
            })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.min(retry::MAX_RETRIES),
            default_delay: Duration::from_secs(self.retry_delay_secs),
            max_delay: Duration::from_secs(self.max_retry_delay_secs),
        }
    }

    /// Resolve the provider. `None` when generation is disabled.
    /// OpenRouter wins when its key is set; Hugging Face otherwise.
    pub fn provider(&self) -> Result<Option<ProviderSelection>, ConfigError> {
        if !self.enabled {
            return Ok(None);
        }
        let timeout = self.timeout()?;
        if !self.openrouter_api_key.is_empty() {
            return Ok(Some(ProviderSelection::Primary(ProviderConfig {
                endpoint: self.openrouter_url.clone(),
                api_key: self.openrouter_api_key.clone(),
                model: self.openrouter_model.clone(),
                timeout,
            })));
        }
        if !self.hf_token.is_empty() {
            return Ok(Some(ProviderSelection::Secondary(ProviderConfig {
                endpoint: self.hf_url.clone(),
                api_key: self.hf_token.clone(),
                model: self.hf_model.clone(),
                timeout,
            })));
        }
        Err(ConfigError::MissingCredential)
    }
}

/// Trimmed, non-empty value for `key`.
fn get_str(map: &HashMap<String, String>, key: &str) -> Option<String> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
