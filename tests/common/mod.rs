//! Shared test helpers: scripted provider, orchestrator and presenter.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use websage::agent::{AgentConfig, AgentEvent, AgentEventPayload, AgentEventSink, Orchestrator};
use websage::conversation::{Speaker, Turn};
use websage::error::ChatError;
use websage::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use websage::session::AgentFactory;
use websage::tools::{AgentToolParameters, Tool, ToolArguments, ToolExecutionContext};
use websage::types::*;
use websage::ui::{Presenter, PromptSource};

/// Offline stand-in for the web search tool.
pub struct StubSearch {
    parameters: AgentToolParameters,
    failure: Option<String>,
}

impl StubSearch {
    /// Answers every query with `1. Results for <query>`.
    pub fn answering() -> Arc<dyn Tool> {
        Arc::new(Self {
            parameters: search_parameters(),
            failure: None,
        })
    }

    /// Fails every call with a tool execution error.
    pub fn failing(message: &str) -> Arc<dyn Tool> {
        Arc::new(Self {
            parameters: search_parameters(),
            failure: Some(message.to_string()),
        })
    }
}

fn search_parameters() -> AgentToolParameters {
    AgentToolParameters::object()
        .string("query", "The search query", true)
        .build()
}

#[async_trait]
impl Tool for StubSearch {
    fn name(&self) -> &str {
        "duckduckgo_search"
    }

    fn description(&self) -> &str {
        "Search the web"
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ChatError> {
        if let Some(message) = &self.failure {
            return Err(ChatError::tool(self.name(), message.clone()));
        }
        let query = args.get_str("query")?;
        Ok(serde_json::Value::String(format!("1. Results for {query}")))
    }
}

enum Scripted {
    Text(String),
    ToolCalls(Vec<AgentToolCall>),
    Failure(u16, String),
}

/// A mock provider that replays queued replies in order.
pub struct MockProvider {
    model_id: String,
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text answer.
    pub fn queue_response(&self, text: &str) {
        self.push(Scripted::Text(text.to_string()));
    }

    /// Queue a reply requesting one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.push(Scripted::ToolCalls(vec![AgentToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: args,
        }]));
    }

    /// Queue an HTTP-style failure.
    pub fn queue_failure(&self, status: u16, message: &str) {
        self.push(Scripted::Failure(status, message.to_string()));
    }

    /// Every request the provider has seen, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, reply: Scripted) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn next(&self, request: &ProviderRequest) -> Scripted {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::Text("Mock response".to_string()))
    }
}

fn usage() -> Usage {
    Usage {
        input_tokens: 10,
        output_tokens: 20,
        total_tokens: 30,
    }
}

/// Split at a char boundary near the middle.
fn halves(s: &str) -> (&str, &str) {
    let mut mid = s.len() / 2;
    while !s.is_char_boundary(mid) {
        mid += 1;
    }
    s.split_at(mid)
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, ChatError> {
        match self.next(request) {
            Scripted::Text(text) => Ok(ProviderResponse {
                text,
                usage: usage(),
                tool_calls: vec![],
                finish_reason: Some(FinishReason::Stop),
            }),
            Scripted::ToolCalls(tool_calls) => Ok(ProviderResponse {
                text: String::new(),
                usage: usage(),
                tool_calls,
                finish_reason: Some(FinishReason::ToolCalls),
            }),
            Scripted::Failure(status, message) => Err(ChatError::api(status, message)),
        }
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, ChatError>>, ChatError> {
        let mut deltas = Vec::new();
        match self.next(request) {
            Scripted::Text(text) => {
                let (a, b) = halves(&text);
                deltas.push(TextStreamDelta::text(a));
                deltas.push(TextStreamDelta::text(b));
                deltas.push(TextStreamDelta::done(Some(FinishReason::Stop), Some(usage())));
            }
            Scripted::ToolCalls(calls) => {
                for (index, call) in calls.into_iter().enumerate() {
                    let args = call.arguments.to_string();
                    let (a, b) = halves(&args);
                    deltas.push(TextStreamDelta::tool_call(ToolCallFragment {
                        index,
                        id: Some(call.id),
                        name: Some(call.name),
                        arguments: a.to_string(),
                    }));
                    deltas.push(TextStreamDelta::tool_call(ToolCallFragment {
                        index,
                        arguments: b.to_string(),
                        ..Default::default()
                    }));
                }
                deltas.push(TextStreamDelta::done(Some(FinishReason::ToolCalls), Some(usage())));
            }
            Scripted::Failure(status, message) => return Err(ChatError::api(status, message)),
        }
        Ok(futures::stream::iter(deltas.into_iter().map(Ok)).boxed())
    }
}

/// What one orchestrator invocation was given.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub prompt: String,
    pub history: Vec<Turn>,
    pub tool_names: Vec<String>,
}

/// Orchestrator that answers `"answer to <prompt>"` and records its inputs.
pub struct ScriptedOrchestrator {
    log: Arc<Mutex<Vec<Invocation>>>,
    tool_names: Vec<String>,
}

#[async_trait]
impl Orchestrator for ScriptedOrchestrator {
    async fn run(
        &self,
        prompt: &str,
        history: &[Turn],
        sink: Option<AgentEventSink>,
    ) -> Result<String, ChatError> {
        self.log.lock().unwrap().push(Invocation {
            prompt: prompt.to_string(),
            history: history.to_vec(),
            tool_names: self.tool_names.clone(),
        });
        let answer = format!("answer to {prompt}");
        if let Some(sink) = sink {
            sink(AgentEvent {
                run_id: uuid::Uuid::nil(),
                seq: 1,
                timestamp: chrono::Utc::now(),
                payload: AgentEventPayload::Completed {
                    answer: answer.clone(),
                },
            });
        }
        Ok(answer)
    }
}

/// Factory handing out [`ScriptedOrchestrator`]s that share one log.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub log: Arc<Mutex<Vec<Invocation>>>,
}

impl RecordingFactory {
    pub fn invocations(&self) -> Vec<Invocation> {
        self.log.lock().unwrap().clone()
    }
}

impl AgentFactory for RecordingFactory {
    fn build(&self, config: AgentConfig) -> Result<Box<dyn Orchestrator>, ChatError> {
        Ok(Box::new(ScriptedOrchestrator {
            log: self.log.clone(),
            tool_names: config.tools.names().into_iter().map(String::from).collect(),
        }))
    }
}

/// Presenter that records everything shown.
#[derive(Default)]
pub struct RecordingPresenter {
    pub turns: Vec<(Speaker, String)>,
    pub infos: Vec<String>,
    pub errors: Vec<String>,
    pub events: Vec<AgentEventPayload>,
}

impl Presenter for RecordingPresenter {
    fn display(&mut self, speaker: Speaker, text: &str) {
        self.turns.push((speaker, text.to_string()));
    }

    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn on_event(&mut self, event: &AgentEvent) {
        self.events.push(event.payload.clone());
    }
}

/// Presenter plus a fixed script of input lines.
#[derive(Default)]
pub struct ScriptedUi {
    pub lines: VecDeque<String>,
    pub shown: RecordingPresenter,
}

impl ScriptedUi {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            shown: RecordingPresenter::default(),
        }
    }
}

impl PromptSource for ScriptedUi {
    fn read_prompt(&mut self) -> Result<Option<String>, ChatError> {
        Ok(self.lines.pop_front())
    }
}

impl Presenter for ScriptedUi {
    fn display(&mut self, speaker: Speaker, text: &str) {
        self.shown.display(speaker, text);
    }

    fn info(&mut self, message: &str) {
        self.shown.info(message);
    }

    fn error(&mut self, message: &str) {
        self.shown.error(message);
    }

    fn on_event(&mut self, event: &AgentEvent) {
        self.shown.on_event(event);
    }
}
