//! Session-scoped conversation history.
//!
//! The store is append-only: turns are never edited or removed, and the
//! order of [`ConversationStore::all`] is the order prompts were submitted.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::ModelMessage;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Speaker {
    Human,
    Assistant,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Speaker::Human, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Convert into the message the model sees.
    pub fn to_message(&self) -> ModelMessage {
        match self.speaker {
            Speaker::Human => ModelMessage::user(self.text.clone()),
            Speaker::Assistant => ModelMessage::assistant(self.text.clone()),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

/// Ordered, append-only list of turns for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn at the end.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, oldest first.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// History as model messages, in order.
    pub fn to_messages(&self) -> Vec<ModelMessage> {
        self.turns.iter().map(Turn::to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn new_store_is_empty() {
        let store = ConversationStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.last().is_none());
    }

    #[test]
    fn append_preserves_order_and_prior_entries() {
        let mut store = ConversationStore::new();
        store.append(Turn::human("first"));
        let snapshot = store.all().to_vec();
        store.append(Turn::assistant("second"));
        store.append(Turn::human("third"));

        assert_eq!(store.len(), 3);
        assert_eq!(&store.all()[..1], snapshot.as_slice());
        let texts: Vec<&str> = store.all().iter().map(Turn::text).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(store.last(), Some(&Turn::human("third")));
    }

    #[test]
    fn turn_text_is_kept_verbatim() {
        let raw = "  spaced\tout 東京 \n";
        let turn = Turn::human(raw);
        assert_eq!(turn.text(), raw);
    }

    #[test]
    fn to_messages_maps_speakers_to_roles() {
        let mut store = ConversationStore::new();
        store.append(Turn::human("hi"));
        store.append(Turn::assistant("hello"));

        let messages = store.to_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text(), "hi");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text(), "hello");
    }

    #[test]
    fn speaker_round_trips_through_strum() {
        assert_eq!(Speaker::Human.to_string(), "Human");
        assert_eq!("Assistant".parse::<Speaker>().ok(), Some(Speaker::Assistant));
        assert_eq!(Turn::assistant("ok").to_string(), "Assistant: ok");
    }
}
