//! REPL command handling with a scripted input source.
#![cfg(feature = "cli")]

mod common;

use common::{RecordingFactory, ScriptedUi};
use pretty_assertions::assert_eq;
use websage::cli::run_repl;
use websage::config::ChatConfig;
use websage::conversation::Speaker;
use websage::session::{ChatSession, MISSING_CREDENTIAL_MESSAGE};

#[tokio::test]
async fn key_command_unblocks_prompts() {
    let factory = RecordingFactory::default();
    let mut ui = ScriptedUi::new(&["hello", "/key sk-test", "hello again"]);
    let mut session = ChatSession::default();

    run_repl(&mut ui, &mut session, &ChatConfig::default(), &factory)
        .await
        .unwrap();

    assert_eq!(ui.shown.infos[0], MISSING_CREDENTIAL_MESSAGE);
    assert_eq!(session.store().len(), 2);
    assert_eq!(factory.invocations().len(), 1);
    assert_eq!(factory.invocations()[0].prompt, "hello again");
}

#[tokio::test]
async fn exit_stops_reading_input() {
    let factory = RecordingFactory::default();
    let mut ui = ScriptedUi::new(&["/exit", "never sent"]);
    let mut session = ChatSession::default();

    run_repl(&mut ui, &mut session, &ChatConfig::default(), &factory)
        .await
        .unwrap();

    assert_eq!(ui.lines.len(), 1);
    assert!(session.store().is_empty());
}

#[tokio::test]
async fn history_command_replays_all_turns() {
    let factory = RecordingFactory::default();
    let mut ui = ScriptedUi::new(&["/key sk-test", "one", "two", "/history"]);
    let mut session = ChatSession::default();

    run_repl(&mut ui, &mut session, &ChatConfig::default(), &factory)
        .await
        .unwrap();

    // Four turns shown live, then the same four again.
    assert_eq!(ui.shown.turns.len(), 8);
    assert_eq!(ui.shown.turns[4], (Speaker::Human, "one".to_string()));
    assert_eq!(ui.shown.turns[4..], ui.shown.turns[..4]);
}

#[tokio::test]
async fn path_like_lines_are_sent_as_prompts() {
    let factory = RecordingFactory::default();
    let mut ui = ScriptedUi::new(&["/key sk-test", "/etc/hosts format?"]);
    let mut session = ChatSession::default();

    run_repl(&mut ui, &mut session, &ChatConfig::default(), &factory)
        .await
        .unwrap();

    assert!(ui.shown.errors.is_empty());
    assert_eq!(factory.invocations().len(), 1);
    assert_eq!(factory.invocations()[0].prompt, "/etc/hosts format?");
    assert_eq!(session.store().len(), 2);
}

#[tokio::test]
async fn unknown_command_is_reported_not_sent() {
    let factory = RecordingFactory::default();
    let mut ui = ScriptedUi::new(&["/key sk-test", "/model qwen-max", "/key"]);
    let mut session = ChatSession::default();

    run_repl(&mut ui, &mut session, &ChatConfig::default(), &factory)
        .await
        .unwrap();

    assert_eq!(ui.shown.errors.len(), 2);
    assert!(ui.shown.errors[0].contains("/model"));
    assert!(factory.invocations().is_empty());
}
