//! Command-line arguments and REPL commands for the `websage` binary.

pub mod repl;

pub use repl::run_repl;

use std::time::Duration;

use clap::Parser;

use crate::auth::Credential;
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::tools::ToolKind;

/// Chat with a web-searching agent over any OpenAI-compatible endpoint.
#[derive(Parser, Debug)]
#[command(name = "websage", version, about = "Chat agent with DuckDuckGo web search")]
pub struct Cli {
    /// API key (falls back to WEBSAGE_API_KEY, DASHSCOPE_API_KEY, OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Chat completions base URL (overrides WEBSAGE_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model id (overrides WEBSAGE_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Max tokens per completion
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Model rounds allowed per prompt
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Search results passed to the model per query
    #[arg(long)]
    pub max_results: Option<usize>,

    /// DuckDuckGo region code, e.g. us-en
    #[arg(long)]
    pub region: Option<String>,

    /// Tool to enable (repeatable)
    #[arg(long = "tool", default_value = "ddg-search")]
    pub tools: Vec<ToolKind>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Wait for complete replies instead of streaming tokens
    #[arg(long)]
    pub no_stream: bool,

    /// Debug logging to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Answer this prompt and exit instead of starting the REPL
    pub prompt: Option<String>,
}

impl Cli {
    /// Layer these flags over `config`.
    pub fn apply(&self, mut config: ChatConfig) -> ChatConfig {
        if let Some(ref url) = self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if self.temperature.is_some() {
            config.settings.temperature = self.temperature;
        }
        if self.max_tokens.is_some() {
            config.settings.max_tokens = self.max_tokens;
        }
        if let Some(n) = self.max_iterations {
            config.max_iterations = n;
        }
        if let Some(n) = self.max_results {
            config.search.max_results = n;
        }
        if self.region.is_some() {
            config.search.region = self.region.clone();
        }
        if let Some(ref system) = self.system {
            config.system_prompt = Some(system.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.tools = self.tools.clone();
        config.stream = !self.no_stream;
        config
    }

    /// The `--api-key` flag, or the first key found in the environment.
    pub fn credential(&self) -> Credential {
        match self.api_key {
            Some(ref key) if !key.trim().is_empty() => Credential::new(key.clone()),
            _ => Credential::from_env(),
        }
    }
}

/// A line typed at the REPL, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// `/key <secret>`
    SetKey(String),
    History,
    Help,
    Exit,
    /// Not a command; send it to the agent.
    None,
}

/// Classify a REPL line.
///
/// Only `/` followed by a bare word is a command; lines such as
/// `/etc/hosts format?` go to the agent as prompts.
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, ChatError> {
    let trimmed = input.trim();
    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    };
    let is_command = command.strip_prefix('/').is_some_and(|word| {
        !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic() || c == '?')
    });
    if !is_command {
        return Ok(SpecialCommand::None);
    }

    match command.to_lowercase().as_str() {
        "/key" if arg.is_empty() => Err(ChatError::InvalidArgument(
            "usage: /key <secret>".to_string(),
        )),
        "/key" => Ok(SpecialCommand::SetKey(arg.to_string())),
        "/history" => Ok(SpecialCommand::History),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        other => Err(ChatError::InvalidArgument(format!(
            "unknown command {other} (try /help)"
        ))),
    }
}

/// REPL help text.
pub fn help_text() -> &'static str {
    "Commands:\n  /key <secret>  set the API key for this session\n  /history       show the conversation so far\n  /help          show this help\n  /exit          quit (Ctrl-D also works)\nAnything else is sent to the agent, including lines like /etc/hosts that\nstart with a path."
}

/// Error message plus a recovery hint when one applies.
pub fn format_error_help(err: &ChatError) -> String {
    match err.recovery_suggestion().hint() {
        Some(hint) => format!("{err}\n{hint}"),
        None => err.to_string(),
    }
}
