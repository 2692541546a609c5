//! Convenience re-exports for common use.

pub use crate::agent::{AgentConfig, AgentEvent, AgentEventPayload, ConversationalAgent, Orchestrator};
pub use crate::auth::Credential;
pub use crate::config::ChatConfig;
pub use crate::conversation::{ConversationStore, Speaker, Turn};
pub use crate::error::{ChatError, Result};
pub use crate::provider::{ModelProvider, OpenAiCompatibleProvider};
pub use crate::session::{ChatSession, SubmitOutcome};
pub use crate::tools::{Tool, ToolKind, ToolSet, WebSearchTool};
pub use crate::types::{GenerationSettings, ModelMessage, Role, TextStreamDelta, Usage};
pub use crate::ui::{Presenter, PromptSource};
