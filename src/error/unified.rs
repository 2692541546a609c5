//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    ToolExecution,
    Unknown,
}

/// Suggested operator action after a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    CheckCredentials,
    CheckConfiguration,
    WaitAndResubmit,
    IncreaseTimeout,
    RephrasePrompt,
    None,
}

impl RecoverySuggestion {
    /// One-line hint shown next to the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CheckCredentials => Some("Check the API key (set it with /key <secret>)."),
            Self::CheckConfiguration => Some("Check --base-url, --model and the other flags."),
            Self::WaitAndResubmit => Some("Wait a moment and send the prompt again."),
            Self::IncreaseTimeout => Some("The endpoint was slow; try again or raise the timeout."),
            Self::RephrasePrompt => Some("Try rephrasing the prompt."),
            Self::None => None,
        }
    }
}
