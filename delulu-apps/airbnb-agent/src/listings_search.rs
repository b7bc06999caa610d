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

//! # Airbnb Listings Client
//!
//! Effectful (network, time) stay search and listing detail retrieval.
//! Every failure is contained here and turned into a failure [`ToolOutcome`].

use crate::http_fetcher::{Fetcher, HttpFetcher};
use crate::listings_query_builder::{ListingQuery, SearchQuery};
use crate::listings_results_parser::{ListingDetails, StaysSearchResults};
use crate::page_readiness::read_client_data;
use crate::robots_policy::RobotsPolicy;
use crate::scrape_errors::ScrapeError;
use crate::scraper_config::ScraperConfig;
use crate::tool_outcome::ToolOutcome;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AirbnbClient<F = HttpFetcher> {
    fetcher: F,
    robots: Arc<RobotsPolicy>,
    config: Arc<ScraperConfig>,
}

impl AirbnbClient<HttpFetcher> {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetcher> AirbnbClient<F> {
    pub fn with_fetcher(config: ScraperConfig, fetcher: F) -> Self {
        let robots = Arc::new(RobotsPolicy::new(&config));
        Self {
            fetcher,
            robots,
            config: Arc::new(config),
        }
    }

    pub fn robots_policy(&self) -> &Arc<RobotsPolicy> {
        &self.robots
    }

    /// Robots gate, fetch, status check and readiness check.
    /// Returns the client data embedded in the page.
    async fn fetch_client_data(&self, url: &str, ignore_robots: bool) -> Result<Value, ScrapeError> {
        if !ignore_robots {
            self.robots.ensure_loaded(&self.fetcher).await;
            if !self.robots.is_allowed(url) {
                return Err(ScrapeError::PolicyViolation);
            }
        }

        let fetch_start = Instant::now();
        tracing::info!("Fetching Airbnb URL: {}", url);
        let page = self.fetcher.fetch(url).await?;
        tracing::info!(
            "HTTP fetch completed in {:?}, got {} KB",
            fetch_start.elapsed(),
            page.body.len() / 1024
        );

        if !page.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: page.status,
                reason: page.reason,
            });
        }

        read_client_data(&page.body).ok_or_else(|| {
            tracing::warn!(
                "Page not ready: no usable deferred state in {} bytes of HTML",
                page.body.len()
            );
            ScrapeError::PageNotReady {
                html_length: page.body.len(),
            }
        })
    }

    pub async fn search(&self, query: &SearchQuery) -> ToolOutcome {
        let overall_start = Instant::now();
        let search_url = query.get_search_url(&self.config.base_url);

        if let Err(e) = query.validate() {
            let err = ScrapeError::InvalidParameters(format!("{:#}", e));
            return ToolOutcome::failure(&err, "searchUrl", &search_url);
        }
        tracing::debug!("Search URL: {}", search_url);

        let result = async {
            let client_data = self
                .fetch_client_data(&search_url, query.ignore_robots_text)
                .await?;
            StaysSearchResults::from_client_data(&client_data, &self.config.base_url)
        }
        .await;

        match result {
            Ok(results) => {
                tracing::info!(
                    "Parsed {} search results in {:?}",
                    results.search_results.len(),
                    overall_start.elapsed()
                );
                ToolOutcome::Success(results.to_mcp_api_response(&search_url))
            }
            Err(e) => {
                tracing::warn!("Search failed after {:?}: {}", overall_start.elapsed(), e);
                ToolOutcome::failure(&e, "searchUrl", &search_url)
            }
        }
    }

    pub async fn listing_details(&self, query: &ListingQuery) -> ToolOutcome {
        let overall_start = Instant::now();
        let listing_url = query.get_listing_url(&self.config.base_url);

        if let Err(e) = query.validate() {
            let err = ScrapeError::InvalidParameters(format!("{:#}", e));
            return ToolOutcome::failure(&err, "listingUrl", &listing_url);
        }
        tracing::debug!("Listing URL: {}", listing_url);

        let result = async {
            let client_data = self
                .fetch_client_data(&listing_url, query.ignore_robots_text)
                .await?;
            ListingDetails::from_client_data(&client_data)
        }
        .await;

        match result {
            Ok(details) => {
                tracing::info!(
                    "Parsed {} listing sections in {:?}",
                    details.details.len(),
                    overall_start.elapsed()
                );
                ToolOutcome::Success(details.to_mcp_api_response(&listing_url))
            }
            Err(e) => {
                tracing::warn!(
                    "Listing details failed after {:?}: {}",
                    overall_start.elapsed(),
                    e
                );
                ToolOutcome::failure(&e, "listingUrl", &listing_url)
            }
        }
    }
}
