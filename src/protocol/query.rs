//! Request validation.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::config::NullBytePolicy;
use crate::protocol::MAX_STRING_LENGTH;

/// Characters of a rejected query kept for logging.
const PREVIEW_CHARS: usize = 50;

/// Why a request payload was rejected before reaching the index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query string too long: {length} characters (max {MAX_STRING_LENGTH})")]
    TooLong { length: usize, preview: String },
}

/// A validated query: NUL bytes handled, decoded, trimmed and bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Validate one request payload.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD. Length is counted in
    /// characters after trimming.
    pub fn parse(payload: &[u8], policy: NullBytePolicy) -> Result<Self, QueryError> {
        let cleaned = apply_null_byte_policy(payload, policy);
        let decoded = String::from_utf8_lossy(&cleaned);
        let text = decoded.trim();

        let length = text.chars().count();
        if length > MAX_STRING_LENGTH {
            return Err(QueryError::TooLong {
                length,
                preview: text.chars().take(PREVIEW_CHARS).collect(),
            });
        }

        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn apply_null_byte_policy(payload: &[u8], policy: NullBytePolicy) -> Cow<'_, [u8]> {
    if !payload.contains(&0) {
        return Cow::Borrowed(payload);
    }
    let cleaned = match policy {
        NullBytePolicy::Strip => payload.iter().copied().filter(|&b| b != 0).collect(),
        NullBytePolicy::Space => payload
            .iter()
            .map(|&b| if b == 0 { b' ' } else { b })
            .collect(),
    };
    Cow::Owned(cleaned)
}
