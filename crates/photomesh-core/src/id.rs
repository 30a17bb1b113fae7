use crate::error::{PhotomeshError, PhotomeshResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted session identifier, in bytes.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Caller-supplied session identifier.
///
/// Restricted to `[A-Za-z0-9_-]` so it can be embedded in storage file names
/// without escaping. Uniqueness is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a raw identifier.
    pub fn parse(raw: impl Into<String>) -> PhotomeshResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(PhotomeshError::InvalidRequest(
                "session_id must not be empty".to_string(),
            ));
        }
        if raw.len() > MAX_SESSION_ID_LEN {
            return Err(PhotomeshError::InvalidRequest(format!(
                "session_id exceeds {MAX_SESSION_ID_LEN} characters"
            )));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(PhotomeshError::InvalidRequest(format!(
                "session_id contains invalid character {bad:?}"
            )));
        }
        Ok(Self(raw))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = PhotomeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = PhotomeshError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
