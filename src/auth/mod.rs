//! Credential input for remote model calls.

pub mod credential;

pub use credential::{Credential, CREDENTIAL_ENV_VARS};
