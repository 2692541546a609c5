//! Line-editor REPL front end.

use std::io::{self, Stdout, Write};

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{Presenter, PromptSource};
use crate::agent::{AgentEvent, AgentEventPayload};
use crate::conversation::Speaker;
use crate::error::ChatError;
use crate::provider::format::{tool_result_to_string, truncate_preview};

const TOOL_PREVIEW_CHARS: usize = 160;

/// Writes turns and streamed agent progress to any [`Write`] sink.
pub struct Renderer<W: Write> {
    out: W,
    /// Assistant text streamed since the last tool call.
    streamed: String,
    /// The line the operator just typed (already visible on screen).
    last_input: Option<String>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            streamed: String::new(),
            last_input: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn note_input(&mut self, line: &str) {
        self.last_input = Some(line.to_string());
    }

    fn end_stream_line(&mut self) {
        if !self.streamed.is_empty() {
            let _ = writeln!(self.out);
        }
    }
}

impl<W: Write> Presenter for Renderer<W> {
    fn display(&mut self, speaker: Speaker, text: &str) {
        match speaker {
            Speaker::Human => {
                if self.last_input.take().as_deref() == Some(text) {
                    return;
                }
                let _ = writeln!(self.out, "{} {}", "Human:".green().bold(), text);
            }
            Speaker::Assistant => {
                if !self.streamed.is_empty() && self.streamed == text {
                    self.streamed.clear();
                    let _ = writeln!(self.out);
                    return;
                }
                self.streamed.clear();
                let _ = writeln!(self.out, "{} {}\n", "Assistant:".cyan().bold(), text);
            }
        }
        let _ = self.out.flush();
    }

    fn info(&mut self, message: &str) {
        let _ = writeln!(self.out, "{}", message.yellow());
    }

    fn error(&mut self, message: &str) {
        self.end_stream_line();
        self.streamed.clear();
        let _ = writeln!(self.out, "{} {}\n", "Error:".red().bold(), message);
    }

    fn on_event(&mut self, event: &AgentEvent) {
        match &event.payload {
            AgentEventPayload::Started => self.streamed.clear(),
            AgentEventPayload::AssistantDelta { text } => {
                if self.streamed.is_empty() {
                    let _ = write!(self.out, "{} ", "Assistant:".cyan().bold());
                }
                self.streamed.push_str(text);
                let _ = write!(self.out, "{text}");
            }
            AgentEventPayload::ToolCallStarted { call } => {
                self.end_stream_line();
                self.streamed.clear();
                let args = truncate_preview(&call.arguments.to_string(), TOOL_PREVIEW_CHARS);
                let label = format!("[{}]", call.name);
                let _ = writeln!(self.out, "  {} {}", label.as_str().dimmed(), args.as_str().dimmed());
            }
            AgentEventPayload::ToolResult { result } => {
                let label = if result.is_error { "[tool error]" } else { "[tool result]" };
                let preview = truncate_preview(
                    &tool_result_to_string(&result.result).replace('\n', " "),
                    TOOL_PREVIEW_CHARS,
                );
                let _ = writeln!(self.out, "  {} {}", label.dimmed(), preview.as_str().dimmed());
            }
            AgentEventPayload::Completed { .. } | AgentEventPayload::Failed { .. } => {}
        }
        let _ = self.out.flush();
    }
}

/// Interactive terminal: reads prompts with `rustyline`, renders to stdout.
pub struct TerminalUi {
    editor: DefaultEditor,
    renderer: Renderer<Stdout>,
    prompt: String,
}

impl TerminalUi {
    pub fn new() -> Result<Self, ChatError> {
        let editor = DefaultEditor::new().map_err(|e| ChatError::Readline(e.to_string()))?;
        Ok(Self {
            editor,
            renderer: Renderer::new(io::stdout()),
            prompt: format!("{} ", ">".bold()),
        })
    }
}

impl PromptSource for TerminalUi {
    fn read_prompt(&mut self) -> Result<Option<String>, ChatError> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                // Keys must not end up in the recall buffer.
                if !trimmed.is_empty() && !trimmed.starts_with("/key") {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                self.renderer.note_input(&line);
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(ChatError::Readline(err.to_string())),
        }
    }
}

impl Presenter for TerminalUi {
    fn display(&mut self, speaker: Speaker, text: &str) {
        self.renderer.display(speaker, text);
    }

    fn info(&mut self, message: &str) {
        self.renderer.info(message);
    }

    fn error(&mut self, message: &str) {
        self.renderer.error(message);
    }

    fn on_event(&mut self, event: &AgentEvent) {
        self.renderer.on_event(event);
    }
}
