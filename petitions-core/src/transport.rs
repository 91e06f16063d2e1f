//! Ways of getting a raw response body for a URL
use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Performs a single GET and hands back the raw body.
///
/// Implementations must not inspect the status code, a non-2xx response is
/// returned like any other and left to the decoder.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET the given URL and return the full response body
    async fn get(&self, url: &Url) -> Result<Vec<u8>, TransportError>;
}

/// Errors which can occur while fetching a body
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or body read failure
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// A [StaticTransport] was asked for more responses than it holds
    #[error("No canned response left for {0}")]
    Exhausted(Url),
    /// A [StaticTransport] failure standing in for a real network error
    #[error("Simulated transport failure: {0}")]
    Simulated(String),
}

/// [Transport] over HTTP(S) using a shared [reqwest::Client]
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client. No headers and no timeout
    /// beyond the client's defaults are set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport reusing an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        debug!(status = %response.status(), %url, "Received response");
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

enum Canned {
    Body(Vec<u8>, Option<Duration>),
    Failure(String),
}

/// [Transport] answering from a queue of canned responses, in order.
///
/// Useful for tests and for running against a recorded feed without network.
/// Every requested URL is recorded.
#[derive(Default)]
pub struct StaticTransport {
    responses: Mutex<VecDeque<Canned>>,
    requested: Mutex<Vec<Url>>,
}

impl StaticTransport {
    /// Create a transport with no responses queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a body to be returned immediately
    pub fn with_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.push(Canned::Body(body.into(), None))
    }

    /// Queue a body which is returned after `delay`
    pub fn with_delayed_body(self, body: impl Into<Vec<u8>>, delay: Duration) -> Self {
        self.push(Canned::Body(body.into(), Some(delay)))
    }

    /// Queue a transport failure
    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.push(Canned::Failure(reason.into()))
    }

    fn push(self, canned: Canned) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(canned);
        self
    }

    /// All URLs requested so far, in request order
    pub fn requested(&self) -> Vec<Url> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Canned::Body(body, None)) => Ok(body),
            Some(Canned::Body(body, Some(delay))) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Some(Canned::Failure(reason)) => Err(TransportError::Simulated(reason)),
            None => Err(TransportError::Exhausted(url.clone())),
        }
    }
}
