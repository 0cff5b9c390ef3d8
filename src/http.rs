//! HTTP access behind a small async trait.
//!
//! The crawler and the scrapers never talk to `reqwest` directly. They take
//! any [`PageFetch`] implementation, which keeps them testable against an
//! in-memory web and leaves transport details (timeouts, redirects, user
//! agent) in one place.
//!
//! # Request policy
//!
//! - Every request carries the configured timeout
//! - Redirects are followed (up to 10 hops)
//! - No request is ever retried

use crate::error::FetchError;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// A successfully downloaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Trait for async page access.
///
/// Implementors perform exactly one attempt per call.
pub trait PageFetch {
    /// Lightweight existence check, following redirects.
    ///
    /// Returns the final status code whatever its value; only transport
    /// failures are errors.
    async fn head(&self, url: &str) -> Result<u16, FetchError>;

    /// Download a page body.
    ///
    /// A status of 400 or above is reported as [`FetchError::Status`].
    async fn get(&self, url: &str) -> Result<Page, FetchError>;
}

/// [`PageFetch`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher whose every request times out after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

fn parse_url(url: &str) -> Result<reqwest::Url, FetchError> {
    reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl PageFetch for ReqwestFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn head(&self, url: &str) -> Result<u16, FetchError> {
        let t0 = Instant::now();
        let response = self.client.head(parse_url(url)?).send().await?;
        let status = response.status().as_u16();
        debug!(
            status,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "HEAD completed"
        );
        Ok(status)
    }

    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<Page, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(parse_url(url)?).send().await?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Status(status));
        }
        let final_url = response.url().to_string();
        let body = response.text().await?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET completed"
        );
        Ok(Page {
            url: final_url,
            status,
            body,
        })
    }
}
