//! Presentation seams between the chat session and whatever renders it.

#[cfg(feature = "cli")]
pub mod terminal;

use crate::agent::AgentEvent;
use crate::conversation::{ConversationStore, Speaker};
use crate::error::ChatError;

/// Renders conversation turns, notices and streamed agent progress.
pub trait Presenter {
    /// Show one conversation turn.
    fn display(&mut self, speaker: Speaker, text: &str);

    /// Show an informational notice (e.g. "add your API key").
    fn info(&mut self, message: &str);

    /// Show a failure.
    fn error(&mut self, message: &str);

    /// Render an intermediate event from a running agent.
    fn on_event(&mut self, event: &AgentEvent);

    /// Re-render every turn in order.
    fn display_history(&mut self, store: &ConversationStore) {
        for turn in store.all() {
            self.display(turn.speaker(), turn.text());
        }
    }
}

/// Source of operator input.
pub trait PromptSource {
    /// Next line of input, or `None` once input is exhausted.
    fn read_prompt(&mut self) -> Result<Option<String>, ChatError>;
}

/// Presenter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn display(&mut self, _speaker: Speaker, _text: &str) {}
    fn info(&mut self, _message: &str) {}
    fn error(&mut self, _message: &str) {}
    fn on_event(&mut self, _event: &AgentEvent) {}
}
