//! Query transports for the maps API
//!
//! The enrichment coordinator never talks to the network directly. It is handed
//! a `QueryTransport`: `HttpTransport` performs real requests, `DryRunTransport`
//! only logs and records the URLs it would have requested.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::query::redacted;

/// Errors that can occur when querying the maps API
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Query URL could not be built
    #[error("Invalid query URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The API answered with a non-OK status
    #[error("Query {url} returned status {status}")]
    Status { url: String, status: String },

    /// The response is missing something the query needs
    #[error("Unexpected response from {url}: {reason}")]
    UnexpectedShape { url: String, reason: String },
}

/// Performs GET requests against the maps API
///
/// `Ok(None)` means the request was not sent (dry run); callers must not
/// persist anything derived from such a call.
pub trait QueryTransport: Send + Sync {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<Value>, QueryError>>;
}

/// Transport that sends real HTTP requests
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Creates a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl QueryTransport for HttpTransport {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<Value>, QueryError>> {
        Box::pin(async move {
            debug!(url = %redacted(url), "GET");
            let response = self.client.get(url.clone()).send().await?.error_for_status()?;
            let text = response.text().await?;
            Ok(Some(serde_json::from_str(&text)?))
        })
    }
}

/// Transport that records requests instead of sending them
#[derive(Debug, Default)]
pub struct DryRunTransport {
    requests: Mutex<Vec<Url>>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<Url> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl QueryTransport for DryRunTransport {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<Value>, QueryError>> {
        Box::pin(async move {
            info!(url = %redacted(url), "dry run: not sending query");
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(url.clone());
            Ok(None)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_records_requests_in_order() {
        let transport = DryRunTransport::new();
        let first = Url::parse("https://example.test/a?key=k").unwrap();
        let second = Url::parse("https://example.test/b").unwrap();

        assert!(transport.get(&first).await.unwrap().is_none());
        assert!(transport.get(&second).await.unwrap().is_none());

        assert_eq!(transport.requests(), vec![first, second]);
    }

    #[test]
    fn test_http_transport_builds_with_timeout() {
        assert!(HttpTransport::new(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_status_error_message_names_url() {
        let err = QueryError::Status {
            url: "https://example.test/q".to_string(),
            status: "ZERO_RESULTS".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("ZERO_RESULTS"));
        assert!(message.contains("https://example.test/q"));
    }
}
