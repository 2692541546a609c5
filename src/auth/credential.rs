use std::fmt;

use crate::error::ChatError;

/// Environment variables consulted for the API key, first match wins.
pub const CREDENTIAL_ENV_VARS: [&str; 3] = ["WEBSAGE_API_KEY", "DASHSCOPE_API_KEY", "OPENAI_API_KEY"];

/// Operator-supplied API key, held in memory for one session.
///
/// `Debug` and `Display` never print the secret.
///
/// # Example
/// ```
/// use websage::auth::Credential;
///
/// let key = Credential::new("sk-test");
/// assert!(key.is_present());
/// assert_eq!(format!("{key:?}"), "Credential(****)");
/// assert!(!Credential::empty().is_present());
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the first non-empty key from [`CREDENTIAL_ENV_VARS`].
    pub fn from_env() -> Self {
        CREDENTIAL_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .map(Self)
            .unwrap_or_default()
    }

    /// Whether a usable (non-blank) key has been supplied.
    pub fn is_present(&self) -> bool {
        !self.0.trim().is_empty()
    }

    /// The raw secret, or [`ChatError::MissingCredential`] when blank.
    pub fn expose(&self) -> Result<&str, ChatError> {
        if self.is_present() {
            Ok(self.0.trim())
        } else {
            Err(ChatError::MissingCredential)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_present() {
            f.write_str("Credential(****)")
        } else {
            f.write_str("Credential(<empty>)")
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_present() { "****" } else { "<empty>" })
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
