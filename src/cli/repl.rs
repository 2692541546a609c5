//! The read-submit-render loop.

use tracing::warn;

use super::{help_text, parse_special_command, SpecialCommand};
use crate::auth::Credential;
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::session::{AgentFactory, ChatSession};
use crate::ui::{Presenter, PromptSource};

/// Drive `session` from `ui` until input ends or the operator exits.
///
/// Agent failures are shown and the loop keeps going; only input errors
/// end it early.
pub async fn run_repl<U>(
    ui: &mut U,
    session: &mut ChatSession,
    config: &ChatConfig,
    factory: &dyn AgentFactory,
) -> Result<(), ChatError>
where
    U: PromptSource + Presenter,
{
    while let Some(line) = ui.read_prompt()? {
        let command = match parse_special_command(&line) {
            Ok(command) => command,
            Err(err) => {
                ui.error(&err.to_string());
                continue;
            }
        };

        match command {
            SpecialCommand::SetKey(secret) => {
                session.set_credential(Credential::new(secret));
                ui.info("API key set for this session.");
            }
            SpecialCommand::History => ui.display_history(session.store()),
            SpecialCommand::Help => ui.info(help_text()),
            SpecialCommand::Exit => break,
            SpecialCommand::None => {
                if let Err(err) = session.submit(&line, config, factory, ui).await {
                    warn!(error = %err, "prompt failed");
                    if let Some(hint) = err.recovery_suggestion().hint() {
                        ui.info(hint);
                    }
                }
            }
        }
    }
    Ok(())
}
