//! HTTP access shared by the news scraper and the open-data fetchers.
//!
//! Every outbound request goes through the [`HttpGet`] trait so callers can be
//! exercised against a stub instead of the network. Two flavours of client
//! are used in practice:
//!
//! - page fetches (news listing and articles): 30 second timeout and a
//!   browser-like `User-Agent`
//! - API fetches (IBGE, SICONFI): 10 second timeout, default identity
//!
//! API callers never see a raw error. [`fetch_json`] folds every failure into
//! a [`FetchOutcome::Failure`] carrying a short message, and callers branch on
//! the tag to decide when to fall back to estimate tables.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Identity sent when fetching HTML pages.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Timeout for news listing and article pages.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the open-data REST endpoints.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Reasons a single GET can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("Timeout")]
    Timeout,

    #[error("{0}")]
    Transport(reqwest::Error),

    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(e)
        }
    }
}

/// Tagged result of a network call.
///
/// `Success` carries the decoded payload, `Failure` the message describing
/// what went wrong (`"HTTP 500"`, `"Timeout"`, or the transport error text).
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Success { data: T },
    Failure { error: String },
}

impl<T> FetchOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchOutcome::Success { data } => Some(data),
            FetchOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Failure { error } => Some(error),
        }
    }
}

/// Minimal async GET abstraction.
///
/// Implementors return the response body for 2xx responses and a
/// [`FetchError`] for anything else.
pub trait HttpGet {
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// [`HttpGet`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client with the given timeout and optional `User-Agent`.
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, FetchError> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Client for HTML pages: 30s timeout, browser identity.
    pub fn for_pages() -> Result<Self, FetchError> {
        Self::new(PAGE_TIMEOUT, Some(BROWSER_USER_AGENT))
    }

    /// Client for the IBGE and SICONFI endpoints: 10s timeout.
    pub fn for_apis() -> Result<Self, FetchError> {
        Self::new(API_TIMEOUT, None)
    }

    #[cfg(test)]
    pub(crate) fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpGet for HttpClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched response body");
        Ok(body)
    }
}

/// GET `url` and decode the body as JSON, folding any error into a
/// [`FetchOutcome::Failure`].
#[instrument(level = "info", skip(client))]
pub async fn fetch_json<C: HttpGet>(client: &C, url: &str) -> FetchOutcome<Value> {
    let result = async {
        let body = client.get_text(url).await?;
        Ok::<_, FetchError>(serde_json::from_str::<Value>(&body)?)
    }
    .await;

    match result {
        Ok(data) => FetchOutcome::Success { data },
        Err(e) => {
            warn!(%url, error = %e, "Request failed");
            FetchOutcome::Failure {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned [`HttpGet`] implementation for unit tests.

    use super::{FetchError, HttpGet};
    use std::cell::RefCell;

    /// Answers each request with the first route whose pattern is a
    /// substring of the URL. Unrouted URLs get a 404.
    #[derive(Debug, Default)]
    pub struct StubClient {
        routes: Vec<(String, Result<String, u16>)>,
        calls: RefCell<Vec<String>>,
    }

    impl StubClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, pattern: &str, body: &str) -> Self {
            self.routes.push((pattern.to_string(), Ok(body.to_string())));
            self
        }

        pub fn fail(mut self, pattern: &str, status: u16) -> Self {
            self.routes.push((pattern.to_string(), Err(status)));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl HttpGet for StubClient {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            let route = self
                .routes
                .iter()
                .find(|(pattern, _)| url.contains(pattern.as_str()));
            match route {
                Some((_, Ok(body))) => Ok(body.clone()),
                Some((_, Err(status))) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Status(404)),
            }
        }
    }
}
