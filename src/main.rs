//! websage CLI binary entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use websage::cli::{format_error_help, run_repl, Cli};
use websage::config::ChatConfig;
use websage::error::ChatError;
use websage::session::{ChatSession, DefaultAgentFactory, SubmitOutcome};
use websage::ui::terminal::TerminalUi;
use websage::ui::Presenter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", format_error_help(&e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("websage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("websage=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, ChatError> {
    let config = cli.apply(ChatConfig::from_env());
    config.validate()?;
    let mut session = ChatSession::new(cli.credential());
    let mut ui = TerminalUi::new()?;
    tracing::info!(session = %session.id(), model = %config.model, "websage started");

    if let Some(prompt) = cli.prompt.as_deref() {
        let code = match session
            .submit(prompt, &config, &DefaultAgentFactory, &mut ui)
            .await
        {
            Ok(SubmitOutcome::Blocked) => ExitCode::FAILURE,
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                if let Some(hint) = err.recovery_suggestion().hint() {
                    ui.info(hint);
                }
                ExitCode::FAILURE
            }
        };
        return Ok(code);
    }

    ui.info("websage: ask anything. /help for commands, /exit to quit.");
    if !session.credential().is_present() {
        ui.info("No API key found. Set one with /key <secret> or WEBSAGE_API_KEY.");
    }
    run_repl(&mut ui, &mut session, &config, &DefaultAgentFactory).await?;
    Ok(ExitCode::SUCCESS)
}
