//! Content retrieval.
//!
//! A [`Fetcher`] makes exactly one attempt per call. There is no retry and
//! no timeout beyond the transport default.

use ureq::Agent;

use crate::error::FetchError;

/// Retrieves the raw text of a remote document.
pub trait Fetcher: Send + Sync {
    /// Fetch the full body for `locator`.
    ///
    /// Succeeds only on a success status with the whole body read.
    fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<String, FetchError> + Send + Sync,
{
    fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        self(locator)
    }
}

/// Default `Accept` header value.
pub const DEFAULT_ACCEPT: &str = "text/markdown, text/plain, */*";

/// Blocking HTTP fetcher backed by `ureq`.
pub struct HttpFetcher {
    agent: Agent,
    user_agent: String,
    accept: String,
    token: Option<String>,
}

impl HttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            user_agent: concat!("mdpull/", env!("CARGO_PKG_VERSION")).to_owned(),
            accept: DEFAULT_ACCEPT.to_owned(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        tracing::debug!(locator, "Fetching remote document");

        let mut request = self
            .agent
            .get(locator)
            .header("User-Agent", &self.user_agent)
            .header("Accept", &self.accept);
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let response = request.call().map_err(|e| {
            tracing::debug!(locator, error = %e, "Request failed");
            FetchError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(locator, status = status.as_u16(), "Non-success response");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .into_body()
            .read_to_string()
            .map_err(FetchError::Body)?;
        tracing::debug!(locator, bytes = body.len(), "Fetched remote document");
        Ok(body)
    }
}
