//! Failures of a single exchange with the conversational endpoint.
//!
//! None of these reach the UI: the dispatcher turns every one of them into a
//! simulated reply. They exist so the fallback can be logged with its cause.

use thiserror::Error;

/// Characters of a non-success body kept for display.
pub const REMOTE_BODY_LIMIT: usize = 200;
/// Characters of an unparsable body kept for display.
pub const MALFORMED_PREFIX_LIMIT: usize = 100;

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The request could not be sent or the response could not be read.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("remote error {status}: {body}")]
    Remote { status: u16, body: String },

    /// The body is not valid JSON.
    #[error("malformed response ({source}): {prefix}")]
    Malformed {
        prefix: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ExchangeError {
    pub fn remote(status: u16, body: &str) -> Self {
        Self::Remote {
            status,
            body: truncate_chars(body, REMOTE_BODY_LIMIT),
        }
    }

    pub fn malformed(body: &str, source: serde_json::Error) -> Self {
        Self::Malformed {
            prefix: truncate_chars(body, MALFORMED_PREFIX_LIMIT),
            source,
        }
    }

    /// Short name of the failure class, used in logs and status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Remote { .. } => "remote",
            Self::Malformed { .. } => "malformed",
        }
    }
}

/// Keep at most `limit` characters of `text`, marking the cut with "...".
pub fn truncate_chars(text: &str, limit: usize) -> String {
    // Use character count, not byte length, for proper UTF-8 handling
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    cut
}
