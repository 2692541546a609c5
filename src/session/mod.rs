//! One operator's chat session: credential gate, history and agent runs.
//!
//! Each prompt goes through the same sequence. A blank credential stops the
//! submission with a notice. Otherwise a fresh agent is built, the Human turn
//! is recorded and shown, the agent runs with the history as it was before
//! this prompt, and the answer is recorded and shown as an Assistant turn.

use std::sync::Arc;

use strum::Display;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::agent::{AgentConfig, AgentEvent, AgentEventSink, ConversationalAgent, Orchestrator};
use crate::auth::Credential;
use crate::config::ChatConfig;
use crate::conversation::{ConversationStore, Speaker, Turn};
use crate::error::ChatError;
use crate::ui::Presenter;

/// Notice shown when a prompt arrives without an API key.
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Please add your API key to continue (use /key <secret> or set WEBSAGE_API_KEY).";

/// Where the session is in handling a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Idle,
    Invoking,
    Blocked,
}

/// What happened to a submitted prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Skipped,
    /// No credential; the notice was shown and the store left untouched.
    Blocked,
    /// The agent answered with this text.
    Answered(String),
}

/// Builds the orchestrator used for a single prompt.
pub trait AgentFactory: Send + Sync {
    fn build(&self, config: AgentConfig) -> Result<Box<dyn Orchestrator>, ChatError>;
}

impl<F> AgentFactory for F
where
    F: Fn(AgentConfig) -> Result<Box<dyn Orchestrator>, ChatError> + Send + Sync,
{
    fn build(&self, config: AgentConfig) -> Result<Box<dyn Orchestrator>, ChatError> {
        self(config)
    }
}

/// Factory producing [`ConversationalAgent`]s against the configured endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAgentFactory;

impl AgentFactory for DefaultAgentFactory {
    fn build(&self, config: AgentConfig) -> Result<Box<dyn Orchestrator>, ChatError> {
        Ok(Box::new(ConversationalAgent::from_config(config)?))
    }
}

/// State owned by one interactive session.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    store: ConversationStore,
    credential: Credential,
    state: SessionState,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(Credential::empty())
    }
}

impl ChatSession {
    pub fn new(credential: Credential) -> Self {
        Self {
            id: Uuid::new_v4(),
            store: ConversationStore::new(),
            credential,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Replace the credential used for subsequent prompts.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
    }

    /// Handle one prompt end to end.
    ///
    /// On failure the error is shown through `presenter` and returned; the
    /// Human turn stays recorded and no Assistant turn is added.
    pub async fn submit(
        &mut self,
        prompt: &str,
        config: &ChatConfig,
        factory: &dyn AgentFactory,
        presenter: &mut dyn Presenter,
    ) -> Result<SubmitOutcome, ChatError> {
        if prompt.trim().is_empty() {
            return Ok(SubmitOutcome::Skipped);
        }

        if !self.credential.is_present() {
            self.state = SessionState::Blocked;
            info!(session = %self.id, "prompt blocked: no credential");
            presenter.info(MISSING_CREDENTIAL_MESSAGE);
            self.state = SessionState::Idle;
            return Ok(SubmitOutcome::Blocked);
        }

        let agent = match factory.build(AgentConfig::new(config, self.credential.clone())) {
            Ok(agent) => agent,
            Err(err) => {
                presenter.error(&err.to_string());
                return Err(err);
            }
        };

        let history = self.store.all().to_vec();
        self.store.append(Turn::human(prompt));
        presenter.display(Speaker::Human, prompt);

        self.state = SessionState::Invoking;
        debug!(session = %self.id, history = history.len(), "invoking agent");
        let result = run_with_events(agent.as_ref(), prompt, &history, presenter).await;
        self.state = SessionState::Idle;

        match result {
            Ok(answer) => {
                self.store.append(Turn::assistant(answer.clone()));
                presenter.display(Speaker::Assistant, &answer);
                info!(session = %self.id, turns = self.store.len(), "prompt answered");
                Ok(SubmitOutcome::Answered(answer))
            }
            Err(err) => {
                presenter.error(&err.to_string());
                Err(err)
            }
        }
    }
}

/// Run the agent while forwarding its events to the presenter as they arrive.
async fn run_with_events(
    agent: &dyn Orchestrator,
    prompt: &str,
    history: &[Turn],
    presenter: &mut dyn Presenter,
) -> Result<String, ChatError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink: AgentEventSink = Arc::new(move |event: AgentEvent| {
        let _ = tx.send(event);
    });

    let run = agent.run(prompt, history, Some(sink));
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            biased;
            Some(event) = rx.recv() => presenter.on_event(&event),
            result = &mut run => break result,
        }
    };

    while let Ok(event) = rx.try_recv() {
        presenter.on_event(&event);
    }
    result
}
