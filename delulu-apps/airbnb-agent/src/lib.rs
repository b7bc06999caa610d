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

// Library for delulu-airbnb-agent
// MCP server for Airbnb stay search and listing details

mod http_fetcher;
mod listings_query_builder;
mod listings_results_parser;
mod listings_search;
mod page_readiness;
mod robots_policy;
mod scrape_errors;
mod scraper_config;
mod tool_outcome;
pub mod value_projection;

// Re-export http_fetcher
pub use http_fetcher::{FetchedPage, Fetcher, HttpFetcher};

// Re-export listings_query_builder
pub use listings_query_builder::{ListingQuery, SearchQuery};

// Re-export listings_results_parser
pub use listings_results_parser::{
    DETAIL_SECTION_SCHEMA, ListingDetails, SEARCH_RESULT_SCHEMA, StaysSearchResults,
    decode_listing_id,
};

// Re-export listings_search
pub use listings_search::AirbnbClient;

// Re-export page_readiness
pub use page_readiness::{is_page_ready, read_client_data};

// Re-export robots_policy
pub use robots_policy::RobotsPolicy;

// Re-export scrape_errors
pub use scrape_errors::{FetchError, ROBOTS_DISALLOWED_MESSAGE, ScrapeError};

// Re-export scraper_config
pub use scraper_config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ScraperConfig};

// Re-export tool_outcome
pub use tool_outcome::ToolOutcome;
