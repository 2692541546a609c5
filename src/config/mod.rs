//! Runtime configuration (layered: CLI flags > env > defaults).

use std::time::Duration;

use crate::error::ChatError;
use crate::provider::http::DEFAULT_REQUEST_TIMEOUT;
use crate::provider::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::tools::{SearchConfig, ToolKind};
use crate::types::GenerationSettings;

/// Rounds of model calls allowed per prompt before the agent gives up.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Everything needed to build an agent for one prompt, minus the credential.
///
/// The credential is kept out of this type so it can be logged and
/// cloned freely.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub settings: GenerationSettings,
    /// Overrides the built-in system prompt when set.
    pub system_prompt: Option<String>,
    pub max_iterations: usize,
    pub tools: Vec<ToolKind>,
    pub search: SearchConfig,
    pub request_timeout: Duration,
    /// Stream completions token by token instead of waiting for the full reply.
    pub stream: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            settings: GenerationSettings::default(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tools: vec![ToolKind::WebSearch],
            search: SearchConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stream: true,
        }
    }
}

impl ChatConfig {
    /// Load overrides from environment variables (WEBSAGE_BASE_URL, WEBSAGE_MODEL, etc.).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("WEBSAGE_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("WEBSAGE_MODEL") {
            config.model = model;
        }
        if let Some(url) = get("WEBSAGE_SEARCH_BASE_URL") {
            config.search.base_url = url.trim_end_matches('/').to_string();
        }
        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolKind>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Reject settings no endpoint would accept.
    pub fn validate(&self) -> Result<(), ChatError> {
        for (name, url) in [("base URL", &self.base_url), ("search URL", &self.search.base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ChatError::Configuration(format!(
                    "{name} must start with http:// or https://, got '{url}'"
                )));
            }
        }
        if self.model.trim().is_empty() {
            return Err(ChatError::Configuration("model name is empty".into()));
        }
        if let Some(t) = self.settings.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ChatError::Configuration(format!(
                    "temperature must be between 0 and 2, got {t}"
                )));
            }
        }
        if self.search.max_results == 0 {
            return Err(ChatError::Configuration("max results must be at least 1".into()));
        }
        Ok(())
    }
}
