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

//! # Scrape Errors
//!
//! Failure taxonomy of the listings pipeline. None of these escape an
//! extractor: they are rendered into the error body of a tool result.

use std::time::Duration;
use thiserror::Error;

/// Returned when the robots.txt rules disallow the requested path.
pub const ROBOTS_DISALLOWED_MESSAGE: &str = "This path is disallowed by Airbnb's robots.txt to this User-agent. \
     You may or may not want to run the server with '--ignore-robots-txt' args";

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("{}", ROBOTS_DISALLOWED_MESSAGE)]
    PolicyViolation,

    #[error("Page not ready: the deferred state payload is missing or malformed ({html_length} bytes of HTML)")]
    PageNotReady { html_length: usize },

    #[error("Failed to extract data: {0}")]
    Extraction(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl ScrapeError {
    pub fn extraction(msg: impl Into<String>) -> Self {
        ScrapeError::Extraction(msg.into())
    }
}
