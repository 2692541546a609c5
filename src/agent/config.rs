//! Per-prompt agent configuration.

use std::time::Duration;

use crate::auth::Credential;
use crate::config::ChatConfig;
use crate::tools::ToolSet;
use crate::types::GenerationSettings;

use super::runner::DEFAULT_SYSTEM_PROMPT;

/// Everything a [`ConversationalAgent`](super::ConversationalAgent) needs,
/// including the credential and the resolved tools.
///
/// Built fresh for every prompt and dropped with the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub credential: Credential,
    pub base_url: String,
    pub model: String,
    pub settings: GenerationSettings,
    pub system_prompt: String,
    pub max_iterations: usize,
    pub tools: ToolSet,
    pub request_timeout: Duration,
    pub stream: bool,
}

impl AgentConfig {
    /// Resolve a chat config and credential into an agent config.
    pub fn new(config: &ChatConfig, credential: Credential) -> Self {
        Self {
            credential,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            settings: config.settings.clone(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_iterations: config.max_iterations.max(1),
            tools: ToolSet::from_kinds(&config.tools, &config.search),
            request_timeout: config.request_timeout,
            stream: config.stream,
        }
    }
}
