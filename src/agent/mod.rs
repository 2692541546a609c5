//! Agent orchestration: the tool-calling loop that answers one prompt.

pub mod config;
pub mod events;
pub mod runner;

pub use config::AgentConfig;
pub use events::{AgentEvent, AgentEventPayload, AgentEventSink, RunId};
pub use runner::{ConversationalAgent, Orchestrator, DEFAULT_SYSTEM_PROMPT, ITERATION_LIMIT_ANSWER};
