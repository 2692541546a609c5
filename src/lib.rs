//! websage: a terminal chat agent that answers with an OpenAI-compatible
//! model and looks things up with DuckDuckGo when it needs to.
//!
//! Every prompt builds a fresh [`agent::ConversationalAgent`] with the
//! session's credential and the search tool, seeds it with the
//! conversation so far, and streams its progress to a [`ui::Presenter`].
//!
//! # Quick Start
//!
//! ```no_run
//! use websage::prelude::*;
//! use websage::session::DefaultAgentFactory;
//! use websage::ui::NullPresenter;
//!
//! # async fn example() -> websage::error::Result<()> {
//! let config = ChatConfig::from_env();
//! let mut session = ChatSession::new(Credential::from_env());
//! let outcome = session
//!     .submit("What's the weather in Tokyo?", &config, &DefaultAgentFactory, &mut NullPresenter)
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod tools;
pub mod types;
pub mod ui;

#[cfg(feature = "cli")]
pub mod cli;
