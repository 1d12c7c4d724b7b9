//! Per-feed failure taxonomy.
//!
//! A [`FeedError`] never leaves the fetcher: it is reported to a
//! [`FeedObserver`](crate::observe::FeedObserver) as a [`FailureKind`] plus a
//! cause string, and the feed is treated as empty for the cycle.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid feed URL '{0}'")]
    InvalidUrl(String),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("body too short ({len} bytes)")]
    Empty { len: usize },

    #[error("body looks like markup, not protobuf")]
    Malformed,

    #[error("protobuf decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
}

impl FeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FeedError::Request(e) if e.is_timeout() => FailureKind::Timeout,
            FeedError::InvalidUrl(_) | FeedError::Request(_) => FailureKind::Network,
            FeedError::Status(_) => FailureKind::Status,
            FeedError::Empty { .. } => FailureKind::Empty,
            FeedError::Malformed => FailureKind::Malformed,
            FeedError::Decode(_) => FailureKind::Decode,
        }
    }
}

/// Coarse failure class reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    Network,
    Status,
    Empty,
    Malformed,
    Decode,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Status => "status",
            FailureKind::Empty => "empty",
            FailureKind::Malformed => "malformed",
            FailureKind::Decode => "decode",
        }
    }

    /// True for failures where bytes arrived but were not a usable feed.
    pub fn is_payload_error(self) -> bool {
        matches!(self, FailureKind::Malformed | FailureKind::Decode)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(FeedError::Malformed.kind(), FailureKind::Malformed);
        assert_eq!(FeedError::Empty { len: 3 }.kind(), FailureKind::Empty);
        assert_eq!(FeedError::Status(503).kind(), FailureKind::Status);
        assert_eq!(
            FeedError::InvalidUrl("::".into()).kind(),
            FailureKind::Network
        );
        assert!(FailureKind::Malformed.is_payload_error());
        assert!(FailureKind::Decode.is_payload_error());
        assert!(!FailureKind::Timeout.is_payload_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(FailureKind::Decode.to_string(), "decode");
        assert_eq!(
            FeedError::Status(502).to_string(),
            "upstream returned HTTP 502"
        );
    }
}
