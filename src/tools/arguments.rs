//! Typed access to tool call arguments.

use crate::error::ChatError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    /// Wrap raw arguments.
    ///
    /// Some endpoints send arguments as a JSON-encoded string (or a plain
    /// query string when the model ignores the schema); both are accepted.
    pub fn new(value: serde_json::Value) -> Self {
        let value = match value {
            serde_json::Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(trimmed).unwrap_or(serde_json::Value::String(raw))
                }
            }
            other => other,
        };
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, ChatError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChatError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional unsigned integer argument.
    pub fn get_u64_opt(&self, key: &str) -> Option<u64> {
        self.value.get(key).and_then(|v| v.as_u64())
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ChatError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            ChatError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
