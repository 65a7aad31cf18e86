//! Error types for remote content loading.

use mdpull_renderer::ParseError;

/// Reason shown for a completed request with a non-success status.
pub const FETCH_FAILED: &str = "Failed to fetch";

/// Reason shown when the request could not complete.
pub const NETWORK_ERROR: &str = "Network error";

/// Error from a single retrieval attempt.
///
/// `Display` is the user-facing reason; transport details are only
/// available through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not complete (DNS, connect, TLS, invalid URL).
    #[error("Network error")]
    Transport(#[source] ureq::Error),

    /// The server answered with a non-success status.
    #[error("Failed to fetch")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be read in full.
    #[error("Network error")]
    Body(#[source] ureq::Error),
}

impl FetchError {
    /// HTTP status when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Error from one load attempt (fetch, transform, parse).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Retrieval failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The parser rejected the transformed text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The transform hook or the parser panicked.
    #[error("transform or parser panicked: {0}")]
    Panicked(String),

    /// The load task ended without producing a result.
    #[error("load task aborted")]
    Aborted,
}

impl From<tokio::task::JoinError> for LoadError {
    fn from(err: tokio::task::JoinError) -> Self {
        if !err.is_panic() {
            return Self::Aborted;
        }
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        Self::Panicked(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason_is_fixed() {
        let err = FetchError::Status { status: 404 };
        assert_eq!(err.to_string(), FETCH_FAILED);
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_load_error_passes_fetch_reason_through() {
        let err = LoadError::from(FetchError::Status { status: 500 });
        assert_eq!(err.to_string(), FETCH_FAILED);
    }

    #[test]
    fn test_parse_error_description() {
        let err = LoadError::from(ParseError("bad input".to_owned()));
        assert_eq!(err.to_string(), "parse error: bad input");
    }
}
