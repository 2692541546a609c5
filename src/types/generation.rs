//! Generation settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Settings controlling text generation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// Parse an OpenAI-style `finish_reason` string.
    pub fn from_openai(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(Self::Stop),
            "length" => Some(Self::Length),
            "tool_calls" | "function_call" => Some(Self::ToolCalls),
            "content_filter" => Some(Self::ContentFilter),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_only_requested_fields() {
        let settings = GenerationSettings::builder()
            .temperature(0.2)
            .max_tokens(512)
            .build();

        assert_eq!(settings.temperature, Some(0.2));
        assert_eq!(settings.max_tokens, Some(512));
        assert_eq!(GenerationSettings::builder().build(), GenerationSettings::default());
    }

    #[test]
    fn finish_reason_parses_legacy_function_call() {
        assert_eq!(
            FinishReason::from_openai("function_call"),
            Some(FinishReason::ToolCalls)
        );
        assert_eq!(FinishReason::from_openai("unknown"), None);
        assert_eq!(FinishReason::ToolCalls.to_string(), "tool_calls");
    }
}
