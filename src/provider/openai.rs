//! OpenAI-compatible Chat Completions provider.
//!
//! Works against any endpoint that speaks the `/chat/completions` dialect
//! (OpenAI, DashScope compatible mode, local gateways). Streaming responses
//! are parsed from server-sent events; tool calls arrive as indexed
//! fragments and are surfaced as [`ToolCallFragment`]s.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::ChatError;
use crate::types::*;

use super::format::tool_result_to_string;
use super::http::{
    bearer_headers, parse_sse_data, shared_client, status_to_error, SseLineBuffer,
};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen-plus";

const PROVIDER_NAME: &str = "openai-compatible";

pub struct OpenAiCompatibleProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: shared_client().clone(),
        }
    }

    /// Use a specific HTTP client (e.g. one with a custom timeout).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn build_request_body(&self, request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model.clone().into());
        body.insert("messages".into(), messages.into());
        body.insert("stream".into(), stream.into());

        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            body.insert("temperature".into(), temp.into());
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                body.insert("tools".into(), tool_defs.into());
            }
        }

        serde_json::Value::Object(body)
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, ChatError> {
        let body = self.build_request_body(request, false);
        debug!(model = %self.model, messages = request.messages.len(), "chat completion");

        let data: OpenAiChatResponse = self.post(&body).await?.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::api(200, "No choices in chat completion response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| AgentToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect();

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: data.usage.map(Usage::from).unwrap_or_default(),
            tool_calls,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .and_then(FinishReason::from_openai),
        })
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, ChatError>>, ChatError> {
        let body = self.build_request_body(request, true);
        debug!(model = %self.model, messages = request.messages.len(), "streaming chat completion");

        let byte_stream = self.post(&body).await?.bytes_stream();

        let stream = async_stream::stream! {
            let mut lines = SseLineBuffer::default();
            let mut done_sent = false;
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ChatError::Network(e));
                        return;
                    }
                };

                lines.push(&chunk);

                while let Some(line) = lines.next_line() {
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    let Some(data) = parse_sse_data(&line) else {
                        continue;
                    };
                    match serde_json::from_str::<OpenAiStreamChunk>(data) {
                        Ok(chunk) => {
                            if let Some(error) = chunk.error {
                                yield Err(ChatError::Stream(error.message));
                                return;
                            }
                            for delta in chunk_to_deltas(chunk) {
                                done_sent |= delta.event_type == StreamEventType::Done;
                                yield Ok(delta);
                            }
                        }
                        Err(err) => debug!(error = %err, "skipping unparseable stream chunk"),
                    }
                }
            }

            if !done_sent {
                yield Ok(TextStreamDelta::done(None, None));
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Split one streamed chunk into text, tool-call and completion deltas.
fn chunk_to_deltas(chunk: OpenAiStreamChunk) -> Vec<TextStreamDelta> {
    let mut deltas = Vec::new();
    let usage = chunk.usage.map(Usage::from);
    let Some(choice) = chunk.choices.into_iter().next() else {
        return deltas;
    };

    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
        deltas.push(TextStreamDelta::text(text));
    }
    for call in choice.delta.tool_calls.unwrap_or_default() {
        let (name, arguments) = match call.function {
            Some(f) => (f.name, f.arguments.unwrap_or_default()),
            None => (None, String::new()),
        };
        deltas.push(TextStreamDelta::tool_call(ToolCallFragment {
            index: call.index.unwrap_or(0),
            id: call.id.filter(|id| !id.is_empty()),
            name: name.filter(|n| !n.is_empty()),
            arguments,
        }));
    }
    if let Some(reason) = choice.finish_reason.as_deref() {
        deltas.push(TextStreamDelta::done(FinishReason::from_openai(reason), usage));
    }
    deltas
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    if let Some(ContentPart::ToolResult(tr)) = msg.content.first() {
        return serde_json::json!({
            "role": "tool",
            "tool_call_id": tr.tool_call_id,
            "content": tool_result_to_string(&tr.result),
        });
    }

    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments.to_string(),
                    }
                })
            })
            .collect();
        let text = msg.text();
        return serde_json::json!({
            "role": role,
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": role, "content": msg.text() })
}

// Chat Completions wire types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAiUsage> for Usage {
    fn from(u: OpenAiUsage) -> Self {
        Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    usage: Option<OpenAiUsage>,
    error: Option<OpenAiErrorBody>,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiStreamToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiStreamToolCall {
    index: Option<usize>,
    id: Option<String>,
    function: Option<OpenAiStreamFunction>,
}

#[derive(Deserialize)]
struct OpenAiStreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolDefinition;

    fn chunk(json: &str) -> OpenAiStreamChunk {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn request_body_includes_tools_and_settings() {
        let provider = OpenAiCompatibleProvider::new("qwen-plus", "sk-test", None);
        let request = ProviderRequest {
            messages: vec![ModelMessage::user("hi")],
            settings: GenerationSettings {
                temperature: Some(0.3),
                ..Default::default()
            },
            tools: Some(vec![ToolDefinition {
                name: "duckduckgo_search".into(),
                description: "search".into(),
                parameters: serde_json::json!({"type": "object"}),
            }]),
        };

        let body = provider.build_request_body(&request, true);
        assert_eq!(body["model"], "qwen-plus");
        assert_eq!(body["stream"], true);
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["tools"][0]["function"]["name"], "duckduckgo_search");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider =
            OpenAiCompatibleProvider::new("m", "k", Some("http://localhost:8080/v1/".into()));
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn tool_messages_use_tool_call_id() {
        let msg = ModelMessage::tool_result("call_9", serde_json::json!("results"), false);
        let json = message_to_openai(&msg);
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_9");
        assert_eq!(json["content"], "results");
    }

    #[test]
    fn assistant_tool_calls_serialize_arguments_as_string() {
        let msg = ModelMessage::assistant_with_tool_calls(
            "",
            vec![AgentToolCall {
                id: "call_1".into(),
                name: "duckduckgo_search".into(),
                arguments: serde_json::json!({"query": "tokyo"}),
            }],
        );
        let json = message_to_openai(&msg);
        assert!(json["content"].is_null());
        assert_eq!(json["tool_calls"][0]["function"]["arguments"], r#"{"query":"tokyo"}"#);
    }

    #[test]
    fn chunk_with_text_yields_text_delta() {
        let deltas = chunk_to_deltas(chunk(
            r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        ));
        assert_eq!(deltas, vec![TextStreamDelta::text("Hel")]);
    }

    #[test]
    fn chunk_with_tool_call_fragment_and_finish() {
        let deltas = chunk_to_deltas(chunk(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"duckduckgo_search","arguments":"{\"qu"}}]},"finish_reason":"tool_calls"}],
               "usage":{"prompt_tokens":3,"completion_tokens":4,"total_tokens":7}}"#,
        ));
        assert_eq!(deltas.len(), 2);
        assert_eq!(
            deltas[0].tool_call,
            Some(ToolCallFragment {
                index: 0,
                id: Some("call_1".into()),
                name: Some("duckduckgo_search".into()),
                arguments: "{\"qu".into(),
            })
        );
        assert_eq!(deltas[1].event_type, StreamEventType::Done);
        assert_eq!(deltas[1].finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(deltas[1].usage.map(|u| u.total_tokens), Some(7));
    }

    #[test]
    fn usage_only_chunk_yields_nothing() {
        let deltas = chunk_to_deltas(chunk(
            r#"{"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":1,"total_tokens":2}}"#,
        ));
        assert!(deltas.is_empty());
    }
}
