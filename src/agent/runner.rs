//! The conversational agent loop: stream a completion, run any requested
//! tools, feed the results back, repeat until the model answers.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::conversation::Turn;
use crate::error::ChatError;
use crate::provider::http::build_client;
use crate::provider::{ModelProvider, OpenAiCompatibleProvider, ProviderRequest};
use crate::tools::{ToolArguments, ToolExecutionContext, ToolSet};
use crate::types::*;

use super::config::AgentConfig;
use super::events::{AgentEventPayload, AgentEventSink, EventEmitter};

pub const DEFAULT_SYSTEM_PROMPT: &str = "Assistant is a large language model that helps with a \
wide range of tasks, from answering simple questions to explaining topics in depth. Assistant \
keeps track of the conversation so far and answers naturally and coherently. When a question \
depends on current events or facts Assistant is unsure of, it uses the available tools to look \
them up before answering, and it bases its answer on what the tools return.";

/// Answer returned when the loop runs out of rounds without a final reply.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// Something that can answer a prompt given the prior conversation.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Answer `prompt`, using `history` as the only conversational memory.
    ///
    /// Intermediate progress is reported through `sink` when one is given.
    async fn run(
        &self,
        prompt: &str,
        history: &[Turn],
        sink: Option<AgentEventSink>,
    ) -> Result<String, ChatError>;
}

/// Tool-calling chat agent over a [`ModelProvider`].
pub struct ConversationalAgent {
    provider: Arc<dyn ModelProvider>,
    tools: ToolSet,
    settings: GenerationSettings,
    system_prompt: String,
    max_iterations: usize,
    stream: bool,
}

impl ConversationalAgent {
    pub fn new(provider: Arc<dyn ModelProvider>, tools: ToolSet) -> Self {
        Self {
            provider,
            tools,
            settings: GenerationSettings::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: crate::config::DEFAULT_MAX_ITERATIONS,
            stream: true,
        }
    }

    /// Build an agent talking to the configured OpenAI-compatible endpoint.
    ///
    /// Fails with [`ChatError::MissingCredential`] when the key is blank.
    pub fn from_config(config: AgentConfig) -> Result<Self, ChatError> {
        let api_key = config.credential.expose()?;
        let provider = OpenAiCompatibleProvider::new(
            config.model,
            api_key,
            Some(config.base_url),
        )
        .with_client(build_client(config.request_timeout)?);

        Ok(Self::new(Arc::new(provider), config.tools)
            .with_settings(config.settings)
            .with_system_prompt(config.system_prompt)
            .with_max_iterations(config.max_iterations)
            .with_streaming(config.stream))
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    fn initial_messages(&self, prompt: &str, history: &[Turn]) -> Vec<ModelMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if !self.system_prompt.is_empty() {
            messages.push(ModelMessage::system(self.system_prompt.clone()));
        }
        messages.extend(history.iter().map(Turn::to_message));
        messages.push(ModelMessage::user(prompt));
        messages
    }

    /// One model call: returns the reply text and any requested tool calls.
    async fn complete(
        &self,
        request: &ProviderRequest,
        emitter: &EventEmitter,
        usage: &mut Usage,
    ) -> Result<ModelReply, ChatError> {
        if !self.stream {
            let response = self.provider.generate_text(request).await?;
            usage.merge(&response.usage);
            if !response.text.is_empty() {
                emitter.emit(AgentEventPayload::AssistantDelta {
                    text: response.text.clone(),
                });
            }
            return Ok(ModelReply {
                text: response.text,
                tool_calls: response.tool_calls,
            });
        }

        let mut stream = self.provider.stream_text(request).await?;
        let mut text = String::new();
        let mut pending: BTreeMap<usize, PendingToolCall> = BTreeMap::new();

        while let Some(delta) = stream.next().await {
            let delta = delta?;
            match delta.event_type {
                StreamEventType::TextDelta => {
                    if !delta.text.is_empty() {
                        text.push_str(&delta.text);
                        emitter.emit(AgentEventPayload::AssistantDelta { text: delta.text });
                    }
                }
                StreamEventType::ToolCallDelta => {
                    if let Some(fragment) = delta.tool_call {
                        pending.entry(fragment.index).or_default().absorb(fragment);
                    }
                }
                StreamEventType::Done => {
                    if let Some(u) = delta.usage {
                        usage.merge(&u);
                    }
                    break;
                }
            }
        }

        let tool_calls = pending
            .into_iter()
            .map(|(index, call)| call.finish(index))
            .collect();
        Ok(ModelReply { text, tool_calls })
    }

    async fn execute_tool(&self, call: &AgentToolCall) -> AgentToolResult {
        let Some(tool) = self.tools.find(&call.name) else {
            warn!(tool = %call.name, "model requested unknown tool");
            return AgentToolResult {
                tool_call_id: call.id.clone(),
                result: serde_json::json!({
                    "error": format!("Tool '{}' not found", call.name)
                }),
                is_error: true,
            };
        };

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            tool_call_id: Some(call.id.clone()),
        };
        match tool.execute(&args, &ctx).await {
            Ok(value) => AgentToolResult {
                tool_call_id: call.id.clone(),
                result: value,
                is_error: false,
            },
            Err(err) => {
                warn!(tool = %call.name, error = %err, "tool call failed");
                AgentToolResult {
                    tool_call_id: call.id.clone(),
                    result: serde_json::json!({ "error": err.to_string() }),
                    is_error: true,
                }
            }
        }
    }
}

#[async_trait]
impl Orchestrator for ConversationalAgent {
    async fn run(
        &self,
        prompt: &str,
        history: &[Turn],
        sink: Option<AgentEventSink>,
    ) -> Result<String, ChatError> {
        let run_id = Uuid::new_v4();
        let emitter = EventEmitter::new(run_id, sink);
        emitter.emit(AgentEventPayload::Started);
        debug!(
            %run_id,
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
            history = history.len(),
            tools = ?self.tools.names(),
            "agent run start"
        );

        let mut messages = self.initial_messages(prompt, history);
        let mut usage = Usage::default();

        for iteration in 1..=self.max_iterations {
            let request = ProviderRequest {
                messages: messages.clone(),
                settings: self.settings.clone(),
                tools: self.tools.definitions(),
            };

            let reply = match self.complete(&request, &emitter, &mut usage).await {
                Ok(reply) => reply,
                Err(err) => {
                    emitter.emit(AgentEventPayload::Failed {
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            };

            debug!(
                %run_id,
                iteration,
                tool_calls = reply.tool_calls.len(),
                text_len = reply.text.len(),
                "agent iteration complete"
            );

            if reply.tool_calls.is_empty() {
                debug!(
                    %run_id,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "agent run completed"
                );
                emitter.emit(AgentEventPayload::Completed {
                    answer: reply.text.clone(),
                });
                return Ok(reply.text);
            }

            messages.push(ModelMessage::assistant_with_tool_calls(
                reply.text,
                reply.tool_calls.clone(),
            ));

            for call in &reply.tool_calls {
                emitter.emit(AgentEventPayload::ToolCallStarted { call: call.clone() });
                let result = self.execute_tool(call).await;
                emitter.emit(AgentEventPayload::ToolResult {
                    result: result.clone(),
                });
                messages.push(ModelMessage::tool_result(
                    result.tool_call_id,
                    result.result,
                    result.is_error,
                ));
            }
        }

        warn!(%run_id, max_iterations = self.max_iterations, "agent stopped at iteration limit");
        emitter.emit(AgentEventPayload::Completed {
            answer: ITERATION_LIMIT_ANSWER.to_string(),
        });
        Ok(ITERATION_LIMIT_ANSWER.to_string())
    }
}

struct ModelReply {
    text: String,
    tool_calls: Vec<AgentToolCall>,
}

/// Tool call being reassembled from streamed fragments.
#[derive(Default)]
struct PendingToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl PendingToolCall {
    fn absorb(&mut self, fragment: ToolCallFragment) {
        if let Some(id) = fragment.id {
            self.id = Some(id);
        }
        if let Some(name) = fragment.name {
            self.name.push_str(&name);
        }
        self.arguments.push_str(&fragment.arguments);
    }

    fn finish(self, index: usize) -> AgentToolCall {
        let arguments = if self.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&self.arguments)
                .unwrap_or(serde_json::Value::String(self.arguments))
        };
        AgentToolCall {
            id: self.id.unwrap_or_else(|| format!("call_{index}")),
            name: self.name,
            arguments,
        }
    }
}
