//! Provider formatting helpers.

use serde_json::Value;

/// Convert a tool result JSON value into a string payload for providers.
pub(crate) fn tool_result_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Shorten `value` to at most `max_chars` characters, marking the cut.
pub fn truncate_preview(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let end = value
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(value.len());
    format!("{}...", &value[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_passed_through_unquoted() {
        assert_eq!(tool_result_to_string(&Value::String("hi".into())), "hi");
        assert_eq!(
            tool_result_to_string(&serde_json::json!({"error": "x"})),
            r#"{"error":"x"}"#
        );
    }

    #[test]
    fn truncate_preview_respects_char_boundaries() {
        assert_eq!(truncate_preview("東京の天気", 2), "東京...");
        assert_eq!(truncate_preview("short", 10), "short");
    }
}
