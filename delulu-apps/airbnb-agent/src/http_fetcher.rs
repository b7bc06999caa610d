//!  Delulu Airbnb Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # HTTP Fetcher
//!
//! Effectful (network, time) page retrieval. One attempt per call, bounded by
//! the configured timeout; retries are left to the caller, who never makes any.

use crate::scrape_errors::FetchError;
use crate::scraper_config::ScraperConfig;
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wreq::redirect::Policy;
use wreq_util::Emulation;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const CACHE_CONTROL: &str = "no-cache";

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves a page body. The seam tests use to replay canned pages.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Arc<wreq::Client>,
    user_agent: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = wreq::Client::builder()
            .emulation(Emulation::Safari18_5)
            .redirect(Policy::default())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, url: &str) -> Result<FetchedPage, wreq::Error> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", ACCEPT)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .header("Cache-Control", CACHE_CONTROL)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok(FetchedPage {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            body,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        tracing::trace!("[fetch] Starting HTTP request to: {}", url);

        // Dropping the request future on timeout aborts the in-flight request.
        let outcome = tokio::time::timeout(self.timeout, self.send(url)).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(Ok(page)) => {
                tracing::debug!(
                    "[fetch] HTTP {} {} in {:?}: {} KB",
                    page.status,
                    page.reason,
                    elapsed,
                    page.body.len() / 1024
                );
                Ok(page)
            }
            Ok(Err(e)) => {
                tracing::debug!("[fetch] Request to {} failed after {:?}: {}", url, elapsed, e);
                Err(FetchError::Network(e.to_string()))
            }
            Err(_) => {
                tracing::warn!("[fetch] Request to {} timed out after {:?}", url, self.timeout);
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }
}
