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

//! # Listings Query Builder
//!
//! Side-effect free URL construction for Airbnb stay search and listing pages.

use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_adults() -> u32 {
    1
}

/// Stay search parameters, as accepted by the `airbnb_search` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Location to search for (city, state, etc.)
    pub location: String,
    /// Google Maps place ID (overrides the location when set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    /// Check-in date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin: Option<String>,
    /// Check-out date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<String>,
    /// Number of adults
    #[serde(default = "default_adults")]
    pub adults: u32,
    /// Number of children
    #[serde(default)]
    pub children: u32,
    /// Number of infants
    #[serde(default)]
    pub infants: u32,
    /// Number of pets
    #[serde(default)]
    pub pets: u32,
    /// Minimum price for the stay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    /// Maximum price for the stay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Base64-encoded pagination cursor returned by a previous search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Skip the robots.txt check for this request
    #[serde(default)]
    pub ignore_robots_text: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            location: String::new(),
            place_id: None,
            checkin: None,
            checkout: None,
            adults: default_adults(),
            children: 0,
            infants: 0,
            pets: 0,
            min_price: None,
            max_price: None,
            cursor: None,
            ignore_robots_text: false,
        }
    }
}

/// Listing detail parameters, as accepted by the `airbnb_listing_details` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    /// The Airbnb listing ID
    pub id: String,
    /// Check-in date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin: Option<String>,
    /// Check-out date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<String>,
    /// Number of adults
    #[serde(default = "default_adults")]
    pub adults: u32,
    /// Number of children
    #[serde(default)]
    pub children: u32,
    /// Number of infants
    #[serde(default)]
    pub infants: u32,
    /// Number of pets
    #[serde(default)]
    pub pets: u32,
    /// Skip the robots.txt check for this request
    #[serde(default)]
    pub ignore_robots_text: bool,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            id: String::new(),
            checkin: None,
            checkout: None,
            adults: default_adults(),
            children: 0,
            infants: 0,
            pets: 0,
            ignore_robots_text: false,
        }
    }
}

fn parse_date(label: &str, s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid {label} date: {s} (expected YYYY-MM-DD)"))
}

fn validate_dates(checkin: Option<&str>, checkout: Option<&str>) -> Result<()> {
    let checkin = checkin.map(|d| parse_date("checkin", d)).transpose()?;
    let checkout = checkout.map(|d| parse_date("checkout", d)).transpose()?;
    if let (Some(checkin), Some(checkout)) = (checkin, checkout) {
        ensure!(checkout > checkin, "Checkout must be after check-in");
    }
    Ok(())
}

/// Guest parameters are only emitted when adults + children is non-zero;
/// infants and pets alone never trigger them.
fn guest_params(adults: u32, children: u32, infants: u32, pets: u32) -> Vec<(&'static str, String)> {
    if adults.saturating_add(children) == 0 {
        return Vec::new();
    }
    vec![
        ("adults", adults.to_string()),
        ("children", children.to_string()),
        ("infants", infants.to_string()),
        ("pets", pets.to_string()),
    ]
}

fn with_query_string(base: String, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return base;
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, query)
}

fn format_price(price: f64) -> String {
    // f64 Display drops the fractional part of whole numbers: 150.0 -> "150"
    price.to_string()
}

impl SearchQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.location.trim().is_empty() || self.place_id.is_some(),
            "Either a location or a place ID is required"
        );
        validate_dates(self.checkin.as_deref(), self.checkout.as_deref())?;
        for price in [self.min_price, self.max_price].into_iter().flatten() {
            ensure!(
                price.is_finite() && price >= 0.0,
                "Price must be a non-negative number"
            );
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            ensure!(
                min <= max,
                "Minimum price cannot be greater than maximum price"
            );
        }
        Ok(())
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(place_id) = &self.place_id {
            params.push(("place_id", place_id.clone()));
        }
        if let Some(checkin) = &self.checkin {
            params.push(("checkin", checkin.clone()));
        }
        if let Some(checkout) = &self.checkout {
            params.push(("checkout", checkout.clone()));
        }
        params.extend(guest_params(self.adults, self.children, self.infants, self.pets));
        if let Some(min_price) = self.min_price {
            params.push(("price_min", format_price(min_price)));
        }
        if let Some(max_price) = self.max_price {
            params.push(("price_max", format_price(max_price)));
        }
        if let Some(cursor) = &self.cursor {
            params.push(("cursor", cursor.clone()));
        }
        params
    }

    pub fn get_search_url(&self, base_url: &str) -> String {
        let location = self.location.trim();
        let path = if location.is_empty() {
            format!("{}/s/homes", base_url)
        } else {
            format!("{}/s/{}/homes", base_url, urlencoding::encode(location))
        };
        with_query_string(path, &self.query_params())
    }
}

impl ListingQuery {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.id.trim().is_empty(), "A listing ID is required");
        validate_dates(self.checkin.as_deref(), self.checkout.as_deref())
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(checkin) = &self.checkin {
            params.push(("check_in", checkin.clone()));
        }
        if let Some(checkout) = &self.checkout {
            params.push(("check_out", checkout.clone()));
        }
        params.extend(guest_params(self.adults, self.children, self.infants, self.pets));
        params
    }

    pub fn get_listing_url(&self, base_url: &str) -> String {
        let path = format!("{}/rooms/{}", base_url, urlencoding::encode(self.id.trim()));
        with_query_string(path, &self.query_params())
    }
}
