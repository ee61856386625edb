//! Gemini API key, read from the environment and handed to the client.

use std::fmt;

use super::DescribeError;

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// A non-empty Gemini API key.
///
/// The only way to build a [`GeminiClient`](super::GeminiClient) is with one
/// of these, so a missing key always fails before any client exists.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Read the key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, DescribeError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the key through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DescribeError> {
        match lookup(GEMINI_API_KEY_VAR) {
            Some(key) if !key.trim().is_empty() => Ok(Self(key.trim().to_string())),
            _ => Err(DescribeError::MissingCredential(GEMINI_API_KEY_VAR)),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
