//! Per-provider fetch failures.

use std::time::Duration;

/// Why a single provider attempt produced no content.
///
/// Every variant is recoverable at the chain level: the chain moves on to
/// the next provider, and only the last provider's error is reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The provider lacks a credential or endpoint; no request was made.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("no content returned")]
    Empty,

    /// The provider answered but reported failure (`success: false`).
    #[error("provider reported failure: {0}")]
    Rejected(String),

    #[error("cancelled")]
    Cancelled,

    /// The URL points at a loopback or private address.
    #[error("blocked private address: {0}")]
    Blocked(String),
}

impl FetchError {
    /// Map a transport error, keeping timeouts and status codes distinct.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if let Some(status) = err.status() {
            Self::Http(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Whether the provider was skipped without making a request.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        assert_eq!(FetchError::Http(404).to_string(), "HTTP 404");
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(30)).to_string(),
            "timed out after 30s"
        );
        assert_eq!(
            FetchError::NotConfigured("firecrawl").to_string(),
            "firecrawl is not configured"
        );
        assert!(FetchError::NotConfigured("linkup").is_not_configured());
        assert!(!FetchError::Empty.is_not_configured());
    }
}
